//! Final output: a dense per-address image of 32-bit ASCII bit-strings,
//! and an optional human-readable listing annotating each word with its
//! source block, decoded fields and any aliases bound to that address.

use crate::block::{Block, BlockKind, Instruction, IrLine, MemoryData};
use crate::config::{Config, NumberFormat};
use crate::error::AsmError;
use crate::symtab::SymbolTable;

fn addresses_of(line: &IrLine) -> &[u64] {
    match line {
        IrLine::Instruction(i) => &i.addresses,
        IrLine::MemoryData(d) => &d.addresses,
        IrLine::Alias { .. } => &[],
    }
}

fn words_and_addresses(line: &IrLine) -> (&[String], &[u64]) {
    match line {
        IrLine::Instruction(i) => (&i.expanded_words, &i.addresses),
        IrLine::MemoryData(d) => (&d.encoded_words, &d.addresses),
        IrLine::Alias { .. } => (&[], &[]),
    }
}

/// Builds the dense memory image. An empty program yields an empty image,
/// not an error.
pub fn emit_image(blocks: &[Block]) -> Result<Vec<String>, AsmError> {
    let mut max_addr: Option<u64> = None;
    for block in blocks {
        for line in &block.lines {
            for addr in addresses_of(line) {
                max_addr = Some(max_addr.map_or(*addr, |m| m.max(*addr)));
            }
        }
    }

    let mem_size = max_addr.map_or(0, |m| m + 1);
    let mut image = vec!["0".repeat(32); mem_size as usize];

    for block in blocks {
        for line in &block.lines {
            let (words, addresses) = words_and_addresses(line);
            for (word, addr) in words.iter().zip(addresses.iter()) {
                if *addr >= mem_size {
                    return Err(AsmError::AddressOutOfBounds { address: *addr, size: mem_size });
                }
                image[*addr as usize] = word.clone();
            }
        }
    }

    Ok(image)
}

/// Builds an annotated listing: one row per emitted word, function blocks
/// first in source order, then memory blocks.
pub fn render_listing(blocks: &[Block], symtab: &SymbolTable, config: &Config) -> String {
    let mut out = String::new();

    for block in blocks.iter().filter(|b| b.kind == BlockKind::Function) {
        for line in &block.lines {
            if let IrLine::Instruction(instr) = line {
                for (word, addr) in instr.expanded_words.iter().zip(instr.addresses.iter()) {
                    out.push_str(&render_instruction_row(block, instr, word, *addr, symtab, config));
                    out.push('\n');
                }
            }
        }
    }

    for block in blocks.iter().filter(|b| b.kind == BlockKind::Memory) {
        for line in &block.lines {
            if let IrLine::MemoryData(data) = line {
                for (word, addr) in data.encoded_words.iter().zip(data.addresses.iter()) {
                    out.push_str(&render_data_row(block, data, word, *addr, symtab, config));
                    out.push('\n');
                }
            }
        }
    }

    out
}

fn render_instruction_row(
    block: &Block,
    instr: &Instruction,
    word: &str,
    addr: u64,
    symtab: &SymbolTable,
    config: &Config,
) -> String {
    let widths = &config.widths;
    let p = &word[0..1];
    let c = &word[1..2];
    let p3_end = 2 + widths.p3 as usize;
    let p2_end = p3_end + widths.p2 as usize;
    let p1_end = p2_end + widths.p1 as usize;
    let p3 = &word[2..p3_end];
    let p2 = &word[p3_end..p2_end];
    let p1 = &word[p2_end..p1_end];

    let (p1v, p2v, p3v) = instr.resolved.unwrap_or((0, 0, 0));
    let (p1s, p2s, p3s) = format_params(p1v, p2v, p3v, config.listing_format);

    let alias_suffix = alias_suffix(symtab, addr);

    format!(
        "{:05x} | p={} c={} p3={} p2={} p1={} | func={}, opcode={}, param1={}, param2={}, param3={}{}",
        addr, p, c, p3, p2, p1, block.name, instr.mnemonic, p1s, p2s, p3s, alias_suffix
    )
}

fn render_data_row(
    block: &Block,
    _data: &MemoryData,
    word: &str,
    addr: u64,
    symtab: &SymbolTable,
    config: &Config,
) -> String {
    let byte3 = &word[0..8];
    let byte2 = &word[8..16];
    let byte1 = &word[16..24];
    let byte0 = &word[24..32];

    let b3 = u8::from_str_radix(byte3, 2).unwrap_or(0);
    let b2 = u8::from_str_radix(byte2, 2).unwrap_or(0);
    let b1 = u8::from_str_radix(byte1, 2).unwrap_or(0);
    let b0 = u8::from_str_radix(byte0, 2).unwrap_or(0);
    let (b3s, b2s, b1s, b0s) = format_bytes(b3, b2, b1, b0, config.listing_format);

    let alias_suffix = alias_suffix(symtab, addr);

    format!(
        "{:05x} | {} {} {} {} | mem={}, byte3={}, byte2={}, byte1={}, byte0={}{}",
        addr, byte3, byte2, byte1, byte0, block.name, b3s, b2s, b1s, b0s, alias_suffix
    )
}

fn alias_suffix(symtab: &SymbolTable, addr: u64) -> String {
    let aliases = symtab.aliases_at(addr);
    if aliases.is_empty() {
        String::new()
    } else {
        format!(" <- alias: {}", aliases.join(", "))
    }
}

fn format_params(p1: u64, p2: u64, p3: u64, format: NumberFormat) -> (String, String, String) {
    match format {
        NumberFormat::Hex => (format!("0x{:X}", p1), format!("0x{:X}", p2), format!("0x{:X}", p3)),
        NumberFormat::Dec => (p1.to_string(), p2.to_string(), p3.to_string()),
        NumberFormat::Bin => (format!("{:b}", p1), format!("{:b}", p2), format!("{:b}", p3)),
    }
}

fn format_bytes(b3: u8, b2: u8, b1: u8, b0: u8, format: NumberFormat) -> (String, String, String, String) {
    match format {
        NumberFormat::Hex => (
            format!("0x{:02X}", b3),
            format!("0x{:02X}", b2),
            format!("0x{:02X}", b1),
            format!("0x{:02X}", b0),
        ),
        NumberFormat::Dec => (b3.to_string(), b2.to_string(), b1.to_string(), b0.to_string()),
        NumberFormat::Bin => (
            format!("{:08b}", b3),
            format!("{:08b}", b2),
            format!("{:08b}", b1),
            format!("{:08b}", b0),
        ),
    }
}

//! Multi-pass layout: assigns block start addresses, resolves every
//! operand and alias, and expands/encodes every content line, repeating
//! until two consecutive passes agree on every block's address and size
//! (or [`crate::config::MAX_PASS`] is exceeded).

use crate::block::{Block, BlockKind, IrLine};
use crate::config::{Config, MAX_PASS};
use crate::data::encode_data_line;
use crate::diagnostics::Diagnostics;
use crate::error::AsmError;
use crate::expand::expand_instruction;
use crate::resolve::resolve_params;
use crate::symtab::SymbolTable;

pub fn run_layout(
    blocks: &mut [Block],
    symtab: &mut SymbolTable,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> Result<(), AsmError> {
    let mut previous: Option<Vec<(Option<u64>, u64)>> = None;

    for pass in 0..MAX_PASS {
        tracing::debug!(pass, "starting layout pass");
        run_pass(blocks, symtab, config, diagnostics)?;

        let snapshot: Vec<(Option<u64>, u64)> = blocks.iter().map(|b| (b.start_addr, b.size)).collect();
        if previous.as_ref() == Some(&snapshot) {
            tracing::debug!(pass, "layout converged");
            return Ok(());
        }
        previous = Some(snapshot);
    }

    Err(AsmError::LayoutDidNotConverge { passes: MAX_PASS })
}

fn run_pass(
    blocks: &mut [Block],
    symtab: &mut SymbolTable,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> Result<(), AsmError> {
    let mut code_cursor = config.code_base;
    let mut data_cursor = config.data_base;

    for block in blocks.iter_mut() {
        match block.kind {
            BlockKind::Function => {
                let start = match symtab.get_function_addr(&block.name) {
                    Some(addr) => addr,
                    None => {
                        symtab.define_function(&block.name, Some(code_cursor))?;
                        code_cursor
                    }
                };
                block.start_addr = Some(start);
                let mut cursor = start;
                let mut saw_multiword_instruction = false;

                for line in block.lines.iter_mut() {
                    match line {
                        IrLine::Instruction(instr) => {
                            let (p1, p2, p3) =
                                resolve_params(&instr.raw_params, config, symtab, instr.source_line)?;
                            instr.resolved = Some((p1, p2, p3));
                            let words =
                                expand_instruction(&instr.mnemonic, p1, p2, p3, config, instr.source_line)?;
                            instr.addresses = (0..words.len() as u64).map(|i| cursor + i).collect();
                            cursor += words.len() as u64;
                            if words.len() > 1 {
                                saw_multiword_instruction = true;
                            }
                            instr.expanded_words = words;
                        }
                        IrLine::Alias { name, intra_block_index } => {
                            if symtab.get_alias_addr(name).is_none() {
                                if saw_multiword_instruction {
                                    tracing::warn!(
                                        alias = %name,
                                        block = %block.name,
                                        "alias address uses the block's declaration-order index; a preceding \
                                         multi-word instruction means this may not name that instruction's first word"
                                    );
                                }
                                let alias_addr = start + *intra_block_index as u64;
                                symtab.define_alias(name, alias_addr, diagnostics)?;
                            }
                        }
                        IrLine::MemoryData(_) => {
                            diagnostics.warn(
                                None,
                                format!("memory data line found inside function block '{}', ignored", block.name),
                            );
                        }
                    }
                }
                block.size = cursor - start;
                code_cursor = cursor;
            }
            BlockKind::Memory => {
                let start = data_cursor;
                block.start_addr = Some(start);
                let mut cursor = start;

                for line in block.lines.iter_mut() {
                    match line {
                        IrLine::MemoryData(data) => {
                            let word =
                                encode_data_line(&data.text, data.source_line, config, symtab, diagnostics)?;
                            data.encoded_words = vec![word];
                            data.addresses = vec![cursor];
                            cursor += 1;
                        }
                        IrLine::Alias { name, intra_block_index } => {
                            if symtab.get_alias_addr(name).is_none() {
                                let alias_addr = start + *intra_block_index as u64;
                                symtab.define_alias(name, alias_addr, diagnostics)?;
                            }
                        }
                        IrLine::Instruction(_) => {
                            diagnostics.warn(
                                None,
                                format!("instruction line found inside memory block '{}', ignored", block.name),
                            );
                        }
                    }
                }
                block.size = cursor - start;
                data_cursor = cursor;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::parse_source;

    #[test]
    fn single_pass_instruction_layout_converges() {
        let config = Config::default();
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let mut blocks = parse_source("function main():\n  halt\n", &config, &mut symtab, &mut diagnostics).unwrap();
        run_layout(&mut blocks, &mut symtab, &config, &mut diagnostics).unwrap();
        assert_eq!(blocks[0].start_addr, Some(config.code_base));
        assert_eq!(blocks[0].size, 1);
    }

    #[test]
    fn forward_alias_reference_converges_across_passes() {
        let config = Config::default();
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let src = "function main():\n  add [@target] R0 R0\n  halt #alias target\n";
        let mut blocks = parse_source(src, &config, &mut symtab, &mut diagnostics).unwrap();
        run_layout(&mut blocks, &mut symtab, &config, &mut diagnostics).unwrap();
        let target_addr = symtab.get_alias_addr("target").unwrap();
        assert_eq!(target_addr, config.code_base + 1);
    }

    #[test]
    fn second_memory_block_starts_after_the_first() {
        let config = Config::default();
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let src = "#memory first:\n  \"0x01\" \"0x02\" \"0x03\" \"0x04\"\n#memory second:\n  \"0x05\" \"0x06\" \"0x07\" \"0x08\"\n";
        let mut blocks = parse_source(src, &config, &mut symtab, &mut diagnostics).unwrap();
        run_layout(&mut blocks, &mut symtab, &config, &mut diagnostics).unwrap();
        assert_eq!(blocks[0].start_addr, Some(config.data_base));
        assert_eq!(blocks[1].start_addr, Some(config.data_base + 1));
    }
}

//! Post-layout checks: no two blocks may occupy overlapping addresses,
//! and the code and data sections as a whole must not overlap either.
//! Zero-size blocks and sections are skipped rather than treated as
//! degenerate overlaps.

use crate::block::{Block, BlockKind};
use crate::error::AsmError;

pub fn validate_layout(blocks: &[Block], code_base: u64, data_base: u64) -> Result<(), AsmError> {
    check_block_overlap(blocks)?;
    check_section_overlap(blocks, code_base, data_base)?;
    Ok(())
}

fn check_block_overlap(blocks: &[Block]) -> Result<(), AsmError> {
    let mut sized: Vec<&Block> = blocks.iter().filter(|b| b.size > 0 && b.start_addr.is_some()).collect();
    sized.sort_by_key(|b| b.start_addr.unwrap());

    for i in 0..sized.len() {
        let a = sized[i];
        let a_start = a.start_addr.unwrap();
        let a_end = a_start + a.size - 1;
        for b in &sized[i + 1..] {
            let b_start = b.start_addr.unwrap();
            let b_end = b_start + b.size - 1;
            if a_start <= b_end && b_start <= a_end {
                return Err(AsmError::BlockOverlap {
                    a: a.name.clone(),
                    a_start,
                    a_end,
                    b: b.name.clone(),
                    b_start,
                    b_end,
                });
            }
        }
    }
    Ok(())
}

fn check_section_overlap(blocks: &[Block], code_base: u64, data_base: u64) -> Result<(), AsmError> {
    let code_size: u64 = blocks.iter().filter(|b| b.kind == BlockKind::Function).map(|b| b.size).sum();
    let data_size: u64 = blocks.iter().filter(|b| b.kind == BlockKind::Memory).map(|b| b.size).sum();

    if code_size == 0 || data_size == 0 {
        return Ok(());
    }

    let code_end = code_base + code_size - 1;
    let data_end = data_base + data_size - 1;

    if code_base <= data_end && data_base <= code_end {
        return Err(AsmError::SectionOverlap {
            code_start: code_base,
            code_end,
            data_start: data_base,
            data_end,
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::parse_source;
    use crate::config::Config;
    use crate::diagnostics::Diagnostics;
    use crate::layout::run_layout;
    use crate::symtab::SymbolTable;

    #[test]
    fn non_overlapping_sections_pass() {
        let config = Config::default();
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let src = "function main():\n  halt\n#memory data:\n  \"0x01\" \"0x02\" \"0x03\" \"0x04\"\n";
        let mut blocks = parse_source(src, &config, &mut symtab, &mut diagnostics).unwrap();
        run_layout(&mut blocks, &mut symtab, &config, &mut diagnostics).unwrap();
        validate_layout(&blocks, config.code_base, config.data_base).unwrap();
    }

    #[test]
    fn overlapping_code_and_data_sections_are_fatal() {
        let config = Config::builder().code_base(0).data_base(0).build().unwrap();
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let src = "function main():\n  halt\n#memory data:\n  \"0x01\" \"0x02\" \"0x03\" \"0x04\"\n";
        let mut blocks = parse_source(src, &config, &mut symtab, &mut diagnostics).unwrap();
        run_layout(&mut blocks, &mut symtab, &config, &mut diagnostics).unwrap();
        let err = validate_layout(&blocks, config.code_base, config.data_base).unwrap_err();
        assert!(matches!(err, AsmError::SectionOverlap { .. }));
    }

    #[test]
    fn an_empty_section_never_overlaps() {
        let config = Config::builder().code_base(0).data_base(0).build().unwrap();
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let mut blocks = parse_source("function main():\n  halt\n", &config, &mut symtab, &mut diagnostics).unwrap();
        run_layout(&mut blocks, &mut symtab, &config, &mut diagnostics).unwrap();
        validate_layout(&blocks, config.code_base, config.data_base).unwrap();
    }
}

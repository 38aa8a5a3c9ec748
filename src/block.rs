//! Turns source text into an ordered list of [`Block`]s, each holding a
//! sequence of [`IrLine`]s. Instructions and data lines within a block
//! share a single intra-block content counter, which is what alias
//! suffixes address.

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::AsmError;
use crate::symtab::SymbolTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Function,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub name: String,
    pub opened_at_line: u32,
    pub lines: Vec<IrLine>,
    pub start_addr: Option<u64>,
    pub size: u64,
}

impl Block {
    fn new(kind: BlockKind, name: String, opened_at_line: u32) -> Self {
        Block {
            kind,
            name,
            opened_at_line,
            lines: Vec::new(),
            start_addr: None,
            size: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub mnemonic: String,
    pub raw_params: [String; 3],
    pub source_line: u32,
    pub resolved: Option<(u64, u64, u64)>,
    pub expanded_words: Vec<String>,
    pub addresses: Vec<u64>,
}

impl Instruction {
    fn new(mnemonic: String, params: Vec<&str>, source_line: u32) -> Self {
        let mut raw = [String::new(), String::new(), String::new()];
        for (slot, tok) in raw.iter_mut().zip(params.into_iter()) {
            *slot = tok.to_owned();
        }
        Instruction {
            mnemonic,
            raw_params: raw,
            source_line,
            resolved: None,
            expanded_words: Vec::new(),
            addresses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryData {
    pub text: String,
    pub memory_name: String,
    pub source_line: u32,
    pub encoded_words: Vec<String>,
    pub addresses: Vec<u64>,
}

impl MemoryData {
    fn new(text: String, memory_name: String, source_line: u32) -> Self {
        MemoryData {
            text,
            memory_name,
            source_line,
            encoded_words: Vec::new(),
            addresses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum IrLine {
    Instruction(Instruction),
    MemoryData(MemoryData),
    Alias { name: String, intra_block_index: u32 },
}

/// Splits a trailing `#alias NAME [NAME...]` suffix off a content line.
/// Returns the line unchanged if `#alias` is present but names nothing,
/// matching the source grammar's requirement of at least one name.
fn split_alias_suffix(line: &str) -> (&str, Vec<String>) {
    if let Some(pos) = line.find("#alias") {
        let after = &line[pos + "#alias".len()..];
        let trimmed = after.trim();
        if trimmed.is_empty() {
            return (line, Vec::new());
        }
        let content = line[..pos].trim_end();
        let names = trimmed.split_whitespace().map(|s| s.to_owned()).collect();
        (content, names)
    } else {
        (line, Vec::new())
    }
}

pub fn parse_source(
    source: &str,
    config: &Config,
    symtab: &mut SymbolTable,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Block>, AsmError> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut current: Option<usize> = None;
    let mut unnamed_memory_count: u32 = 0;
    let mut intra_block_index: u32 = 0;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        let line = match raw_line.find("//") {
            Some(pos) => raw_line[..pos].trim(),
            None => raw_line.trim(),
        };
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("#macro") {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            if parts.len() != 2 {
                return Err(AsmError::InvalidMacroDirective { line: line_no });
            }
            let value = crate::numeric::parse_literal(parts[1], line_no)?;
            symtab.define_macro(parts[0], value, diagnostics)?;
            continue;
        }

        if let Some(rest) = line.strip_prefix("#memory") {
            intra_block_index = 0;
            let trimmed = rest.trim().trim_end_matches(':').trim();
            let name = if trimmed.is_empty() {
                unnamed_memory_count += 1;
                let name = format!("Unnamed_Memory_{}", unnamed_memory_count);
                diagnostics.warn(Some(line_no), format!("no memory name given, synthesized '{}'", name));
                name
            } else {
                trimmed.to_owned()
            };
            blocks.push(Block::new(BlockKind::Memory, name, line_no));
            current = Some(blocks.len() - 1);
            continue;
        }

        if let Some(rest) = line.strip_prefix("function") {
            intra_block_index = 0;
            let name = rest
                .trim()
                .split('(')
                .next()
                .unwrap_or("")
                .trim()
                .trim_end_matches(':')
                .trim();
            if name.is_empty() {
                return Err(AsmError::FunctionNameMissing { line: line_no });
            }
            blocks.push(Block::new(BlockKind::Function, name.to_owned(), line_no));
            current = Some(blocks.len() - 1);
            symtab.define_function(name, None)?;
            continue;
        }

        let (content, alias_names) = split_alias_suffix(line);
        let mut tokens = content.split_whitespace();
        let first = tokens.next().unwrap_or("");
        let mnemonic = first.to_lowercase();

        let block_idx = if config.is_opcode(&mnemonic) {
            let params: Vec<&str> = tokens.collect();
            let instruction = Instruction::new(mnemonic, params, line_no);
            let idx = match current {
                Some(i) => i,
                None => {
                    diagnostics.warn(Some(line_no), "no block open, starting default function block 'main'");
                    blocks.push(Block::new(BlockKind::Function, "main".to_owned(), line_no));
                    symtab.define_function("main", None)?;
                    blocks.len() - 1
                }
            };
            blocks[idx].lines.push(IrLine::Instruction(instruction));
            idx
        } else {
            let idx = match current {
                Some(i) if blocks[i].kind == BlockKind::Memory => i,
                _ => {
                    unnamed_memory_count += 1;
                    let name = format!("Unnamed_Memory_{}", unnamed_memory_count);
                    diagnostics.warn(Some(line_no), format!("no memory block open, starting default '{}'", name));
                    blocks.push(Block::new(BlockKind::Memory, name, line_no));
                    blocks.len() - 1
                }
            };
            let data = MemoryData::new(content.to_owned(), blocks[idx].name.clone(), line_no);
            blocks[idx].lines.push(IrLine::MemoryData(data));
            idx
        };
        current = Some(block_idx);
        intra_block_index += 1;

        for alias_name in alias_names {
            if alias_name.is_empty() {
                return Err(AsmError::EmptyAliasName { line: line_no });
            }
            blocks[block_idx].lines.push(IrLine::Alias {
                name: alias_name,
                intra_block_index: intra_block_index - 1,
            });
        }
    }

    Ok(blocks)
}

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn function_block_collects_instructions() {
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let src = "function main():\n  add R0 R1 R0\n  halt\n";
        let blocks = parse_source(src, &config(), &mut symtab, &mut diagnostics).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Function);
        assert_eq!(blocks[0].lines.len(), 2);
    }

    #[test]
    fn instruction_with_no_open_block_starts_default_main() {
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let blocks = parse_source("halt\n", &config(), &mut symtab, &mut diagnostics).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "main");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn data_line_with_no_open_memory_block_synthesizes_one() {
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let blocks = parse_source("\"0x01\" \"0x02\" \"0x03\" \"0x04\"\n", &config(), &mut symtab, &mut diagnostics).unwrap();
        assert_eq!(blocks[0].kind, BlockKind::Memory);
        assert_eq!(blocks[0].name, "Unnamed_Memory_1");
    }

    #[test]
    fn alias_suffix_is_attached_to_preceding_content_line() {
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let src = "function main():\n  halt #alias entry exit\n";
        let blocks = parse_source(src, &config(), &mut symtab, &mut diagnostics).unwrap();
        assert_eq!(blocks[0].lines.len(), 3);
        match &blocks[0].lines[1] {
            IrLine::Alias { name, intra_block_index } => {
                assert_eq!(name, "entry");
                assert_eq!(*intra_block_index, 0);
            }
            other => panic!("expected alias, got {:?}", other),
        }
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let src = "// a comment\n\nfunction main():\n  halt // trailing comment\n";
        let blocks = parse_source(src, &config(), &mut symtab, &mut diagnostics).unwrap();
        assert_eq!(blocks[0].lines.len(), 1);
    }

    #[test]
    fn empty_function_name_is_fatal() {
        let mut symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let err = parse_source("function ():\n", &config(), &mut symtab, &mut diagnostics).unwrap_err();
        assert!(matches!(err, AsmError::FunctionNameMissing { .. }));
    }
}

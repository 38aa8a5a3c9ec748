//! Assembler for a 32-bit-word processor whose instruction operands can
//! expand an instruction into several words, depending on their magnitude.
//!
//! [`assemble`] is the library entry point: it parses source text into
//! blocks, runs the fixed-point layout pass that resolves every symbol and
//! encodes every instruction and data word, validates that no two blocks
//! (or sections) overlap, and emits a dense per-address image. The crate
//! does not parse command-line arguments, format console output, or route
//! logs anywhere; those are the thin CLI binary's job, not the library's.

mod bits;
mod block;
mod config;
mod data;
mod diagnostics;
mod emit;
mod error;
mod expand;
mod layout;
mod numeric;
mod resolve;
mod symtab;
mod validate;

#[cfg(test)]
mod test;

pub use block::{Block, BlockKind, Instruction, IrLine, MemoryData};
pub use config::{Config, ConfigBuilder, FieldWidths, NumberFormat, MAX_PASS};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::AsmError;
pub use symtab::SymbolTable;

pub type Result<T> = std::result::Result<T, AsmError>;

/// A completed assembly: the laid-out blocks, the final symbol table, and
/// the dense per-address memory image.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub blocks: Vec<Block>,
    pub symbols: SymbolTable,
    pub image: Vec<String>,
}

impl Assembled {
    /// Renders the human-readable annotated listing for this assembly.
    pub fn listing(&self, config: &Config) -> String {
        emit::render_listing(&self.blocks, &self.symbols, config)
    }
}

/// Assembles `source` under `config`, returning the completed image
/// alongside any non-fatal diagnostics collected along the way.
pub fn assemble(source: &str, config: &Config) -> Result<(Assembled, Diagnostics)> {
    let mut diagnostics = Diagnostics::new();
    let mut symtab = SymbolTable::new();

    let mut blocks = block::parse_source(source, config, &mut symtab, &mut diagnostics)?;
    tracing::debug!(blocks = blocks.len(), "parsed source into blocks");

    layout::run_layout(&mut blocks, &mut symtab, config, &mut diagnostics)?;

    if let Some(name) = symtab.unresolved_aliases().first() {
        return Err(AsmError::UnresolvedAlias { name: (*name).to_owned() });
    }
    if let Some(name) = symtab.unresolved_functions().first() {
        return Err(AsmError::UnresolvedFunction { name: (*name).to_owned() });
    }

    validate::validate_layout(&blocks, config.code_base, config.data_base)?;

    let image = emit::emit_image(&blocks)?;

    Ok((
        Assembled {
            blocks,
            symbols: symtab,
            image,
        },
        diagnostics,
    ))
}

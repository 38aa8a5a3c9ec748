//! Resolves one operand token to a numeric value: register names, macro
//! names, `[@alias]` and `[name():]` references, and plain literals.
//! References to an alias or function that is not yet bound resolve to 0
//! for the current pass; the symbol table records the reference so the
//! final convergence check can tell a genuinely dangling reference from
//! one that simply hadn't been laid out yet.

use crate::config::Config;
use crate::error::AsmError;
use crate::numeric::parse_literal;
use crate::symtab::SymbolTable;

pub fn resolve_param(
    token: &str,
    config: &Config,
    symtab: &mut SymbolTable,
    line: u32,
) -> Result<u64, AsmError> {
    let token = token.trim();
    if token == "[]" {
        return Ok(0);
    }

    if let Some(inner) = token.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let inner = inner.trim();

        if let Some(fname) = inner.strip_suffix("():") {
            let fname = fname.trim();
            symtab.mark_function_referenced(fname);
            return Ok(symtab.get_function_addr(fname).unwrap_or(0));
        }

        if let Some(aname) = inner.strip_prefix('@') {
            symtab.mark_alias_referenced(aname);
            return Ok(symtab.get_alias_addr(aname).unwrap_or(0));
        }

        if let Some(mname) = inner.strip_prefix('#') {
            return Ok(symtab.get_macro_value(mname).unwrap_or(0));
        }

        if let Some(value) = config.register(inner) {
            return Ok(value);
        }

        if let Some(value) = symtab.get_macro_value(inner) {
            return Ok(value);
        }

        return parse_literal(inner, line);
    }

    parse_literal(token, line)
}

pub fn resolve_params(
    raw: &[String; 3],
    config: &Config,
    symtab: &mut SymbolTable,
    line: u32,
) -> Result<(u64, u64, u64), AsmError> {
    let mut values = [0u64; 3];
    for (slot, token) in values.iter_mut().zip(raw.iter()) {
        if !token.is_empty() {
            *slot = resolve_param(token, config, symtab, line)?;
        }
    }
    Ok((values[0], values[1], values[2]))
}

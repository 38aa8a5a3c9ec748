//! Literal parsing: hex (`0x`), binary (`0b`) and decimal integers, with
//! optional `_` digit-group separators and surrounding quotes stripped.

use crate::error::AsmError;

pub fn parse_literal(raw: &str, line: u32) -> Result<u64, AsmError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|&c| c != '_' && c != '"')
        .collect();
    let invalid = || AsmError::InvalidLiteral {
        line,
        text: raw.to_owned(),
    };

    if let Some(rest) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        if rest.is_empty() {
            return Err(invalid());
        }
        return u64::from_str_radix(rest, 2).map_err(|_| invalid());
    }
    if let Some(rest) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        if rest.is_empty() {
            return Err(invalid());
        }
        return u64::from_str_radix(rest, 16).map_err(|_| invalid());
    }
    if cleaned.is_empty() {
        return Err(invalid());
    }
    cleaned.parse::<u64>().map_err(|_| invalid())
}

//! Encodes a single `#memory` content line into a 32-bit ASCII bit-string.
//!
//! Two forms are accepted: four quoted byte expressions (`"A" "B" "C" "D"`,
//! each a literal, macro name, or a `flag | flag & ~flag` combinator chain
//! folded left to right), or one unquoted raw bit-string up to 32 bits
//! wide, right-padded with zeroes.

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::AsmError;
use crate::numeric::parse_literal;
use crate::symtab::SymbolTable;

pub fn encode_data_line(
    text: &str,
    line: u32,
    config: &Config,
    symtab: &SymbolTable,
    diagnostics: &mut Diagnostics,
) -> Result<String, AsmError> {
    let trimmed = text.trim();
    if trimmed.contains('"') {
        encode_quoted(trimmed, line, config, symtab, diagnostics)
    } else {
        encode_unquoted(trimmed, line, diagnostics)
    }
}

fn extract_quoted(text: &str) -> Vec<String> {
    text.split('"')
        .enumerate()
        .filter_map(|(i, s)| if i % 2 == 1 { Some(s.to_owned()) } else { None })
        .collect()
}

fn encode_quoted(
    text: &str,
    line: u32,
    config: &Config,
    symtab: &SymbolTable,
    diagnostics: &mut Diagnostics,
) -> Result<String, AsmError> {
    let parts = extract_quoted(text);
    if parts.len() != 4 {
        return Err(AsmError::QuotedDataCount { line, found: parts.len() });
    }
    let mut word = String::with_capacity(32);
    for part in &parts {
        let byte = encode_byte(part, line, config, symtab, diagnostics)?;
        word.push_str(&format!("{:08b}", byte));
    }
    Ok(word)
}

fn encode_unquoted(text: &str, line: u32, diagnostics: &mut Diagnostics) -> Result<String, AsmError> {
    let bits = text.replace(' ', "");
    if bits.len() > 32 {
        return Err(AsmError::UnquotedDataTooLong { line, bits: bits.len() });
    }
    if !bits.chars().all(|c| c == '0' || c == '1') {
        return Err(AsmError::NonBinaryData { line });
    }
    if bits.len() < 32 {
        diagnostics.warn(
            Some(line),
            format!("unquoted data line has {} bits, padding with '0's", bits.len()),
        );
    }
    Ok(format!("{:0<32}", bits))
}

fn encode_byte(
    raw: &str,
    line: u32,
    config: &Config,
    symtab: &SymbolTable,
    diagnostics: &mut Diagnostics,
) -> Result<u8, AsmError> {
    let part = raw.trim();
    if part.chars().any(|c| "|&^~+-".contains(c)) {
        return encode_flag_expr(part, line, config, symtab, diagnostics);
    }
    if let Some(rest) = part.strip_prefix("0b").or_else(|| part.strip_prefix("0B")) {
        if rest.len() > 8 {
            let value = parse_literal(part, line)?;
            return Err(AsmError::ByteOverflow { line, value: value as i64 });
        }
    }
    if let Some(value) = symtab.get_macro_value(part) {
        return to_byte(value as i64, line);
    }
    let value = parse_literal(part, line)?;
    to_byte(value as i64, line)
}

fn to_byte(value: i64, line: u32) -> Result<u8, AsmError> {
    if !(0..256).contains(&value) {
        return Err(AsmError::ByteOverflow { line, value });
    }
    Ok(value as u8)
}

/// Folds a `|`/`&`/`^`/`~`/`+`/`-` flag expression left to right.
///
/// The `~` operator is ambiguous in the source grammar it was distilled
/// from: it reads as "bitwise-not the right-hand operand" but the
/// original implementation actually complements the running total and
/// discards the operand's value (after still evaluating it, so an unknown
/// flag name on that side is still an error). This mirrors that behavior
/// and leaves a diagnostic each time it fires.
fn encode_flag_expr(
    expr: &str,
    line: u32,
    config: &Config,
    symtab: &SymbolTable,
    diagnostics: &mut Diagnostics,
) -> Result<u8, AsmError> {
    let mut operators = Vec::new();
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in expr.chars() {
        if "|&^~+-".contains(c) {
            tokens.push(current.trim().to_owned());
            current = String::new();
            operators.push(c);
        } else {
            current.push(c);
        }
    }
    tokens.push(current.trim().to_owned());

    let flag_value = |tok: &str| -> Result<i64, AsmError> {
        if let Some(v) = symtab.get_macro_value(tok) {
            Ok(v as i64)
        } else if let Some(v) = config.flag(tok) {
            Ok(v as i64)
        } else {
            Err(AsmError::UnknownFlag {
                line,
                flag: tok.to_owned(),
            })
        }
    };

    let mut acc = flag_value(&tokens[0])?;
    for (i, op) in operators.iter().enumerate() {
        let rhs = flag_value(&tokens[i + 1])?;
        match op {
            '|' => acc |= rhs,
            '&' => acc &= rhs,
            '^' => acc ^= rhs,
            '+' => acc += rhs,
            '-' => acc -= rhs,
            '~' => {
                diagnostics.warn(
                    Some(line),
                    format!(
                        "'~' complements the running total and discards the value of '{}'",
                        tokens[i + 1]
                    ),
                );
                acc = !acc & 0xFF;
            }
            _ => unreachable!(),
        }
    }

    to_byte(acc, line)
}

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn quoted_hexadecimal_data_word() {
        let symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let word = encode_data_line("\"0x11\" \"0x22\" \"0x33\" \"0x44\"", 1, &config(), &symtab, &mut diagnostics).unwrap();
        assert_eq!(word, "00010001001000100011001101000100");
    }

    #[test]
    fn unquoted_raw_bit_string_is_right_padded() {
        let symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let word = encode_data_line("101", 1, &config(), &symtab, &mut diagnostics).unwrap();
        assert_eq!(word.len(), 32);
        assert!(word.starts_with("101"));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn unquoted_data_longer_than_32_bits_is_an_error() {
        let symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let long = "1".repeat(33);
        let err = encode_data_line(&long, 1, &config(), &symtab, &mut diagnostics).unwrap_err();
        assert!(matches!(err, AsmError::UnquotedDataTooLong { .. }));
    }

    #[test]
    fn quoted_data_must_have_exactly_four_bytes() {
        let symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let err = encode_data_line("\"0x01\" \"0x02\" \"0x03\"", 1, &config(), &symtab, &mut diagnostics).unwrap_err();
        assert!(matches!(err, AsmError::QuotedDataCount { found: 3, .. }));
    }

    #[test]
    fn flag_combinator_folds_left_to_right() {
        let symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let mut builder_config = Config::builder();
        builder_config = builder_config.flag("READ", 0b001).flag("WRITE", 0b010);
        let config = builder_config.build().unwrap();
        let word = encode_data_line("\"READ | WRITE\" \"0x00\" \"0x00\" \"0x00\"", 1, &config, &symtab, &mut diagnostics).unwrap();
        assert_eq!(&word[0..8], "00000011");
    }

    #[test]
    fn tilde_complements_running_total_and_warns() {
        let mut diagnostics = Diagnostics::new();
        let builder_config = Config::builder().flag("READ", 0b001);
        let config = builder_config.build().unwrap();
        let symtab = SymbolTable::new();
        let byte = encode_byte("READ ~ WRITE", 1, &config, &symtab, &mut diagnostics);
        // WRITE is unknown, so evaluating it for errors still fails fatally.
        assert!(byte.is_err());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn tilde_still_discards_a_known_right_hand_flag() {
        let mut diagnostics = Diagnostics::new();
        let builder_config = Config::builder().flag("READ", 0b001).flag("WRITE", 0b010);
        let config = builder_config.build().unwrap();
        let symtab = SymbolTable::new();
        let byte = encode_byte("READ ~ WRITE", 1, &config, &symtab, &mut diagnostics).unwrap();
        assert_eq!(byte, (!0b001i64 & 0xFF) as u8);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn byte_overflow_is_an_error() {
        let symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let err = encode_byte("0x1FF", 1, &config(), &symtab, &mut diagnostics).unwrap_err();
        assert!(matches!(err, AsmError::ByteOverflow { .. }));
    }

    #[test]
    fn binary_literal_over_8_digits_is_an_error_even_if_in_range() {
        let symtab = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        // value is 255 (fits in a byte), but 9 digits exceeds the binary form's width limit.
        let err = encode_byte("0b011111111", 1, &config(), &symtab, &mut diagnostics).unwrap_err();
        assert!(matches!(err, AsmError::ByteOverflow { .. }));
    }
}

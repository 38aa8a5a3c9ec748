//! Expands a resolved instruction into one or more 32-bit words.
//!
//! Each word packs `opcode | p1 | p2 | p3 | continuation | parity`, filled
//! least-significant-bit-first from the operand queues and rendered
//! most-significant-bit-first. A word's continuation bit is set whenever
//! any operand queue still has bits left for the next word; parity is
//! even across the 31 preceding bits.

use std::collections::VecDeque;

use crate::bits::{format_word, int_to_lsb_bits};
use crate::config::Config;
use crate::error::AsmError;

pub fn expand_instruction(
    mnemonic: &str,
    p1: u64,
    p2: u64,
    p3: u64,
    config: &Config,
    line: u32,
) -> Result<Vec<String>, AsmError> {
    let opcode_bits = config
        .opcode_bits(mnemonic)
        .ok_or_else(|| AsmError::UnknownOpcode {
            line,
            mnemonic: mnemonic.to_owned(),
        })?;

    if opcode_bits.len() as u32 != config.widths.opcode {
        return Err(AsmError::OpcodeWidthMismatch {
            mnemonic: mnemonic.to_owned(),
            expected: config.widths.opcode,
            found: opcode_bits.len(),
        });
    }

    let mut opcode_queue: VecDeque<u8> = opcode_bits
        .chars()
        .rev()
        .map(|c| if c == '1' { 1 } else { 0 })
        .collect();
    let mut p1_queue: VecDeque<u8> = int_to_lsb_bits(p1).into();
    let mut p2_queue: VecDeque<u8> = int_to_lsb_bits(p2).into();
    let mut p3_queue: VecDeque<u8> = int_to_lsb_bits(p3).into();

    let widths = &config.widths;
    let mut words = Vec::new();

    loop {
        let mut field_bits = Vec::with_capacity(widths.payload_width() as usize + 2);
        for _ in 0..widths.opcode {
            field_bits.push(opcode_queue.pop_front().unwrap_or(0));
        }
        for _ in 0..widths.p1 {
            field_bits.push(p1_queue.pop_front().unwrap_or(0));
        }
        for _ in 0..widths.p2 {
            field_bits.push(p2_queue.pop_front().unwrap_or(0));
        }
        for _ in 0..widths.p3 {
            field_bits.push(p3_queue.pop_front().unwrap_or(0));
        }

        let continuation = u8::from(!p1_queue.is_empty() || !p2_queue.is_empty() || !p3_queue.is_empty());
        field_bits.push(continuation);

        let parity = field_bits.iter().fold(0u8, |acc, b| acc ^ b);
        field_bits.push(parity);

        let msb_first: Vec<u8> = field_bits.into_iter().rev().collect();
        words.push(format_word(&msb_first));

        if p1_queue.is_empty() && p2_queue.is_empty() && p3_queue.is_empty() {
            break;
        }
    }

    Ok(words)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn small_operands_expand_to_a_single_word() {
        let config = Config::default();
        let words = expand_instruction("halt", 0, 0, 0, &config, 1).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].len(), 32);
    }

    #[test]
    fn each_word_has_even_parity() {
        let config = Config::default();
        let words = expand_instruction("add", 1, 2, 3, &config, 1).unwrap();
        for word in &words {
            let ones = word.chars().filter(|&c| c == '1').count();
            assert_eq!(ones % 2, 0);
        }
    }

    #[test]
    fn operand_exceeding_field_width_forces_continuation() {
        let config = Config::default();
        // p1 field is 14 bits wide; a larger p1 must expand to more than one word.
        let words = expand_instruction("add", 1 << 20, 0, 0, &config, 1).unwrap();
        assert!(words.len() > 1);
        // bit 0 is parity, bit 1 is the continuation flag.
        assert_eq!(words[0].as_bytes()[1], b'1');
    }

    #[test]
    fn final_word_has_continuation_bit_clear() {
        let config = Config::default();
        let words = expand_instruction("add", 1 << 20, 0, 0, &config, 1).unwrap();
        let last = words.last().unwrap();
        assert_eq!(last.as_bytes()[1], b'0');
    }

    #[test]
    fn unknown_opcode_is_an_error() {
        let config = Config::default();
        let err = expand_instruction("nope", 0, 0, 0, &config, 7).unwrap_err();
        assert!(matches!(err, AsmError::UnknownOpcode { line: 7, .. }));
    }
}

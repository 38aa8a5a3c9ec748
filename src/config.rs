//! Run configuration: section base addresses, instruction field widths,
//! the opcode/register/flag tables and listing number format.
//!
//! A `Config` is immutable once built; `ConfigBuilder` validates every
//! invariant (field widths summing to 32 bits, opcode bit-strings matching
//! the configured opcode width) at construction time rather than deferring
//! those checks to encode time.

use std::collections::HashMap;

use crate::error::AsmError;

/// Upper bound on symbol-resolution passes before layout is declared
/// non-convergent.
pub const MAX_PASS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Hex,
    Dec,
    Bin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWidths {
    pub opcode: u32,
    pub p1: u32,
    pub p2: u32,
    pub p3: u32,
}

impl FieldWidths {
    pub fn payload_width(&self) -> u32 {
        self.opcode + self.p1 + self.p2 + self.p3
    }
}

impl Default for FieldWidths {
    fn default() -> Self {
        FieldWidths {
            opcode: 5,
            p1: 14,
            p2: 5,
            p3: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub code_base: u64,
    pub data_base: u64,
    pub widths: FieldWidths,
    pub listing_format: NumberFormat,
    opcodes: HashMap<String, String>,
    registers: HashMap<String, u64>,
    flags: HashMap<String, u8>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn opcode_bits(&self, mnemonic: &str) -> Option<&str> {
        self.opcodes.get(mnemonic).map(String::as_str)
    }

    pub fn is_opcode(&self, mnemonic: &str) -> bool {
        self.opcodes.contains_key(mnemonic)
    }

    pub fn register(&self, name: &str) -> Option<u64> {
        self.registers.get(&name.to_lowercase()).copied()
    }

    pub fn flag(&self, name: &str) -> Option<u8> {
        self.flags.get(name).copied()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::builder()
            .opcode("jump", "00010")
            .opcode("branch", "00100")
            .opcode("add", "00011")
            .opcode("setreg", "00001")
            .opcode("halt", "11111")
            .register("R0", 0)
            .register("R1", 1)
            .register("R2", 2)
            .register("R3", 3)
            .build()
            .expect("default configuration is always internally consistent")
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    code_base: Option<u64>,
    data_base: Option<u64>,
    widths: Option<FieldWidths>,
    opcodes: HashMap<String, String>,
    registers: HashMap<String, u64>,
    flags: HashMap<String, u8>,
    listing_format: Option<NumberFormat>,
}

impl ConfigBuilder {
    pub fn code_base(mut self, base: u64) -> Self {
        self.code_base = Some(base);
        self
    }

    pub fn data_base(mut self, base: u64) -> Self {
        self.data_base = Some(base);
        self
    }

    pub fn widths(mut self, widths: FieldWidths) -> Self {
        self.widths = Some(widths);
        self
    }

    pub fn opcode(mut self, mnemonic: &str, bits: &str) -> Self {
        self.opcodes.insert(mnemonic.to_lowercase(), bits.to_owned());
        self
    }

    pub fn register(mut self, name: &str, value: u64) -> Self {
        self.registers.insert(name.to_lowercase(), value);
        self
    }

    pub fn flag(mut self, name: &str, value: u8) -> Self {
        self.flags.insert(name.to_owned(), value);
        self
    }

    pub fn listing_format(mut self, format: NumberFormat) -> Self {
        self.listing_format = Some(format);
        self
    }

    pub fn build(self) -> Result<Config, AsmError> {
        let widths = self.widths.unwrap_or_default();
        if widths.payload_width() + 2 != 32 {
            return Err(AsmError::InvalidConfig {
                reason: format!(
                    "field widths (opcode {} + p1 {} + p2 {} + p3 {}) + 2 must equal 32, got {}",
                    widths.opcode,
                    widths.p1,
                    widths.p2,
                    widths.p3,
                    widths.payload_width() + 2
                ),
            });
        }

        for (mnemonic, bits) in &self.opcodes {
            if !bits.chars().all(|c| c == '0' || c == '1') {
                return Err(AsmError::InvalidConfig {
                    reason: format!("opcode '{}' bit-string '{}' is not binary", mnemonic, bits),
                });
            }
            if bits.len() as u32 != widths.opcode {
                return Err(AsmError::OpcodeWidthMismatch {
                    mnemonic: mnemonic.clone(),
                    expected: widths.opcode,
                    found: bits.len(),
                });
            }
        }

        Ok(Config {
            code_base: self.code_base.unwrap_or(0x0),
            data_base: self.data_base.unwrap_or(0x50),
            widths,
            listing_format: self.listing_format.unwrap_or(NumberFormat::Hex),
            opcodes: self.opcodes,
            registers: self.registers,
            flags: self.flags,
        })
    }
}

//! The condition register (CR) and its field update protocol.

use bitvec::field::BitField;
use bitvec::order::Msb0;
use bitvec::view::BitView;

/// Number of 4-bit fields in the condition register.
pub const FIELD_COUNT: u8 = 8;

/// Bit position of LT within a condition register field.
pub const LT: u8 = 0;
/// Bit position of GT within a condition register field.
pub const GT: u8 = 1;
/// Bit position of EQ within a condition register field.
pub const EQ: u8 = 2;
/// Bit position of SO within a condition register field.
pub const SO: u8 = 3;

/// The condition register: 32 bits, divided into eight 4-bit fields CR0 up to CR7.
///
/// Bits are numbered MSB-first, as the architecture does: bit 0 is the most significant bit of
/// the register, and field `n` occupies bits `4n..4n+3`. Field CR0 is the implicit target of
/// record-form instructions; the compare instructions can target any field.
#[derive(Debug, Clone, Default)]
pub struct ConditionRegister {
    cr: u32,
}

impl ConditionRegister {
    pub fn new() -> Self {
        Self { cr: 0 }
    }

    /// Returns the register's raw 32-bit value.
    pub fn read(&self) -> u32 {
        self.cr
    }

    /// Overwrites the register's raw 32-bit value.
    pub fn write(&mut self, value: u32) {
        self.cr = value;
    }

    /// Returns the value of a single bit, in MSB-first numbering (`0..=31`).
    pub fn bit(&self, index: u8) -> bool {
        self.cr.view_bits::<Msb0>()[index as usize]
    }

    /// Sets the value of a single bit, in MSB-first numbering (`0..=31`).
    pub fn set_bit(&mut self, index: u8, value: bool) {
        self.cr.view_bits_mut::<Msb0>().set(index as usize, value);
    }

    /// Returns the 4-bit value of field `crf` (`0..=7`).
    pub fn field(&self, crf: u8) -> u8 {
        let start = 4 * crf as usize;
        self.cr.view_bits::<Msb0>()[start..start + 4].load_be()
    }

    /// Sets the 4-bit value of field `crf` (`0..=7`). Only the low 4 bits of `value` are used.
    pub fn set_field(&mut self, crf: u8, value: u8) {
        let start = 4 * crf as usize;
        self.cr.view_bits_mut::<Msb0>()[start..start + 4].store_be(value & 0xF);
    }

    /// Updates field CR0 from a signed 32-bit result, the implicit side effect of record-form
    /// instructions.
    ///
    /// LT, GT, and EQ are derived from comparing `result` (as a signed integer) against zero.
    /// SO is a copy of `summary_overflow`, which must be the XER's SO bit *after* any overflow
    /// update the instruction performs. Callers are responsible for that ordering.
    pub fn update_field0(&mut self, result: u32, summary_overflow: bool) {
        let result = result as i32;
        let mut field = 0u8;
        if result < 0 {
            field |= 0b1000;
        } else if result > 0 {
            field |= 0b0100;
        } else {
            field |= 0b0010;
        }
        if summary_overflow {
            field |= 0b0001;
        }
        self.set_field(0, field);
    }
}

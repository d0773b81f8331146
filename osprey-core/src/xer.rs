//! The fixed-point exception register (XER) and its update protocol.

use bitvec::order::Msb0;
use bitvec::view::BitView;

mod idx {
    //! MSB-first bit indices of the defined XER bits.

    pub const SO: usize = 0;
    pub const OV: usize = 1;
    pub const CA: usize = 2;
}

/// The fixed-point exception register.
///
/// Three single bits are defined, in MSB-first numbering: SO (bit 0), OV (bit 1), and CA
/// (bit 2). The low seven bits hold the transfer byte count used by the load/store string
/// instructions. All other bits are software-visible storage with no hardware meaning.
///
/// SO is sticky: the update helpers only ever set it, never clear it. Clearing requires an
/// explicit whole-register write (`mtspr` to XER, or `mcrxr`'s clearing side effect).
#[derive(Debug, Clone, Default)]
pub struct Xer {
    xer: u32,
}

impl Xer {
    pub fn new() -> Self {
        Self { xer: 0 }
    }

    /// Returns the register's raw 32-bit value.
    pub fn read(&self) -> u32 {
        self.xer
    }

    /// Overwrites the register's raw 32-bit value. This is the only way to clear SO.
    pub fn write(&mut self, value: u32) {
        self.xer = value;
    }

    /// Returns the SO (summary overflow) bit.
    pub fn so(&self) -> bool {
        self.xer.view_bits::<Msb0>()[idx::SO]
    }

    /// Sets the SO (summary overflow) bit to `value`.
    pub fn set_so(&mut self, value: bool) {
        self.xer.view_bits_mut::<Msb0>().set(idx::SO, value);
    }

    /// Returns the OV (overflow) bit.
    pub fn ov(&self) -> bool {
        self.xer.view_bits::<Msb0>()[idx::OV]
    }

    /// Sets the OV (overflow) bit to `value`.
    pub fn set_ov(&mut self, value: bool) {
        self.xer.view_bits_mut::<Msb0>().set(idx::OV, value);
    }

    /// Returns the CA (carry) bit.
    pub fn ca(&self) -> bool {
        self.xer.view_bits::<Msb0>()[idx::CA]
    }

    /// Sets the CA (carry) bit to `value`.
    pub fn set_ca(&mut self, value: bool) {
        self.xer.view_bits_mut::<Msb0>().set(idx::CA, value);
    }

    /// Returns the transfer byte count (the low seven bits), used by `lswx`/`stswx`.
    pub fn byte_count(&self) -> u32 {
        self.xer & 0x0000_007F
    }

    /// Updates OV and SO from an addition (or subtraction rewritten as addition).
    ///
    /// The true sum of up to three operands, each taken as a signed 32-bit value, is computed
    /// in 64 bits and compared against the sign-extended truncated `result`. On mismatch both
    /// OV and SO are set; on match only OV is cleared, leaving SO sticky.
    pub fn update_overflow_add(&mut self, result: u32, s1: u32, s2: u32, s3: u32) {
        let wide = s1 as i32 as i64 + s2 as i32 as i64 + s3 as i32 as i64;
        self.finish_overflow_update(wide != result as i32 as i64);
    }

    /// Updates CA from an addition of up to three operands, each taken as an unsigned 32-bit
    /// value: CA is set iff the 64-bit sum does not fit in 32 bits.
    pub fn update_carry_add(&mut self, s1: u32, s2: u32, s3: u32) {
        let wide = s1 as u64 + s2 as u64 + s3 as u64;
        self.set_ca(wide > 0xFFFF_FFFF);
    }

    /// Updates OV and SO from a signed division of `a` by `b` that produced `result`.
    ///
    /// Division by zero counts as overflow, as does the one quotient (`i32::MIN / -1`) that
    /// does not fit in 32 bits.
    pub fn update_overflow_div_signed(&mut self, result: u32, a: u32, b: u32) {
        let overflow = if b == 0 {
            true
        } else {
            let wide = a as i32 as i64 / b as i32 as i64;
            wide != result as i32 as i64
        };
        self.finish_overflow_update(overflow);
    }

    /// Updates OV and SO from an unsigned division of `a` by `b` that produced `result`.
    ///
    /// Division by zero counts as overflow; every other unsigned quotient fits.
    pub fn update_overflow_div_unsigned(&mut self, result: u32, a: u32, b: u32) {
        let overflow = if b == 0 {
            true
        } else {
            let wide = a as u64 / b as u64;
            wide != result as u64
        };
        self.finish_overflow_update(overflow);
    }

    /// Updates OV and SO from a signed multiplication: `product` is the full 64-bit product,
    /// and overflow means it differs from its own sign-extended 32-bit truncation.
    pub fn update_overflow_mul(&mut self, product: i64) {
        self.finish_overflow_update(product != product as i32 as i64);
    }

    fn finish_overflow_update(&mut self, overflow: bool) {
        if overflow {
            self.set_ov(true);
            self.set_so(true);
        } else {
            self.set_ov(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_positions() {
        let mut xer = Xer::new();
        xer.set_so(true);
        assert_eq!(0x8000_0000, xer.read());
        xer.set_ov(true);
        assert_eq!(0xC000_0000, xer.read());
        xer.set_ca(true);
        assert_eq!(0xE000_0000, xer.read());
    }

    #[test]
    fn test_byte_count() {
        let mut xer = Xer::new();
        xer.write(0xFFFF_FFAB);
        assert_eq!(0x2B, xer.byte_count());
    }

    #[test]
    fn test_overflow_add_sets_ov_and_so() {
        let mut xer = Xer::new();
        let result = 0x7FFF_FFFFu32.wrapping_add(1);
        xer.update_overflow_add(result, 0x7FFF_FFFF, 1, 0);
        assert!(xer.ov());
        assert!(xer.so());
    }

    #[test]
    fn test_overflow_add_clear_keeps_so_sticky() {
        let mut xer = Xer::new();
        xer.update_overflow_add(0x8000_0000, 0x7FFF_FFFF, 1, 0);
        assert!(xer.so());
        xer.update_overflow_add(3, 1, 2, 0);
        assert!(!xer.ov());
        assert!(xer.so());
    }

    #[test]
    fn test_carry_add() {
        let mut xer = Xer::new();
        xer.update_carry_add(0xFFFF_FFFF, 1, 0);
        assert!(xer.ca());
        xer.update_carry_add(1, 2, 0);
        assert!(!xer.ca());
        // Three operands can carry even when each pair would not.
        xer.update_carry_add(0x8000_0000, 0x7FFF_FFFF, 1);
        assert!(xer.ca());
    }

    #[test]
    fn test_div_signed_overflow_cases() {
        let mut xer = Xer::new();
        xer.update_overflow_div_signed(0, 7, 0);
        assert!(xer.ov());
        assert!(xer.so());

        let mut xer = Xer::new();
        let a = 0x8000_0000u32;
        let b = 0xFFFF_FFFFu32;
        let result = (a as i32 as i64 / b as i32 as i64) as u32;
        xer.update_overflow_div_signed(result, a, b);
        assert!(xer.ov());

        let mut xer = Xer::new();
        xer.update_overflow_div_signed((-3i32 / 2) as u32, (-3i32) as u32, 2);
        assert!(!xer.ov());
        assert!(!xer.so());
    }

    #[test]
    fn test_div_unsigned_overflow_cases() {
        let mut xer = Xer::new();
        xer.update_overflow_div_unsigned(0, 7, 0);
        assert!(xer.ov());

        let mut xer = Xer::new();
        xer.update_overflow_div_unsigned(0xFFFF_FFFF / 2, 0xFFFF_FFFF, 2);
        assert!(!xer.ov());
    }

    #[test]
    fn test_mul_overflow() {
        let mut xer = Xer::new();
        xer.update_overflow_mul(0x1_0000_0000);
        assert!(xer.ov());
        assert!(xer.so());
        xer.update_overflow_mul(-1);
        assert!(!xer.ov());
        assert!(xer.so());
    }
}

//! The general purpose register file and register specifiers.

use std::fmt;
use std::fmt::Formatter;

/// The type of a single general purpose register.
pub type Gpr = u32;

/// The bit width of the general purpose registers.
pub const GPR_WIDTH: u32 = Gpr::BITS;

/// The number of general purpose registers available (indices start at `0` for `r0`).
pub const LEN: u8 = 32;

/// A PowerPC core's general purpose registers.
///
/// There are 32 word-size (32 bit) registers, named `r0` up to `r31`. Unlike some other
/// architectures, `r0` is an ordinary register: reads return what was last written, and writes
/// stick. The only special treatment of `r0` is in effective address computation of some
/// instruction forms, where a base register specifier of `r0` contributes zero instead of the
/// register's value. That rule lives with the address computation, not here.
///
/// There is also the `pc` register which holds the Program Counter (also 32 bits).
#[derive(Debug, Clone)]
pub struct Registers {
    gpr: [Gpr; LEN as usize],
    pc: u32,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Registers {
    /// Returns a fresh set of all-zero registers.
    pub fn new(initial_pc: u32) -> Self {
        Self {
            gpr: [0; LEN as usize],
            pc: initial_pc,
        }
    }

    /// Returns the value of a general purpose register.
    pub fn gpr(&self, specifier: Specifier) -> u32 {
        self.gpr[usize::from(specifier)]
    }

    /// Sets the value of a general purpose register.
    pub fn set_gpr(&mut self, specifier: Specifier, value: u32) {
        self.gpr[usize::from(specifier)] = value;
    }

    /// Returns the value of the `pc` register.
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Returns a mutable reference to the `pc` register value.
    pub fn pc_mut(&mut self) -> &mut u32 {
        &mut self.pc
    }
}

/// A general purpose register specifier. Can take values in the range `0..LEN`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct Specifier(u8);

impl Specifier {
    /// Register `r0`. Reads as zero only when used as the base of some addressing forms.
    pub const R0: Self = Specifier(0);

    /// Register `r1`, the stack pointer by software convention.
    pub const R1: Self = Specifier(1);

    /// Register `r3`, the first argument/return value register by software convention.
    pub const R3: Self = Specifier(3);

    /// Register `r31`, the highest-numbered register.
    pub const R31: Self = Specifier(31);

    /// Create a register specifier from its index, returning `None` if `index > 31`.
    pub fn new<U: TryInto<u8>>(index: U) -> Option<Self> {
        let index = index.try_into().ok()?;
        (index < 32).then_some(Self(index))
    }

    /// Convert a 5-bit value into a register specifier.
    /// Panics if the value doesn't fit in 5 bits (`0..=31`).
    pub fn from_u5(value_u5: u8) -> Self {
        const_assert_eq!(LEN, 32);
        if value_u5 > 31 {
            panic!("out of range u5 used");
        }
        Self(value_u5)
    }

    /// Return an iterator over all register specifiers, starting at r0 up to r31.
    pub fn iter_all() -> impl Iterator<Item = Self> {
        (0..32).map(Self)
    }

    /// Returns the specifier of the next register, wrapping from r31 back to r0.
    ///
    /// The load/store string instructions walk the register file this way.
    pub fn wrapping_next(self) -> Self {
        Self((self.0 + 1) % 32)
    }
}

impl From<Specifier> for u8 {
    fn from(value: Specifier) -> Self {
        value.0
    }
}

impl From<Specifier> for u32 {
    fn from(value: Specifier) -> Self {
        value.0 as u32
    }
}

impl From<Specifier> for usize {
    fn from(value: Specifier) -> Self {
        value.0 as usize
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(32, GPR_WIDTH);
        const_assert!(LEN > 1);
    }

    #[test]
    fn test_r0_is_a_real_register() {
        let mut registers = Registers::default();
        assert_eq!(0, registers.gpr(Specifier::R0));
        registers.set_gpr(Specifier::R0, 0xDEADBEEF);
        assert_eq!(0xDEADBEEF, registers.gpr(Specifier::R0));
        assert_eq!(0, registers.pc());
    }

    #[test]
    fn test_write_to_pc() {
        let mut registers = Registers::default();
        assert_eq!(0, registers.pc());
        *registers.pc_mut() = 0xDEADBEEF;
        assert_eq!(0xDEADBEEF, registers.pc());
        assert_eq!(0, registers.gpr(Specifier::R0));
    }

    #[test]
    fn test_get_set_gpr() {
        let mut registers = Registers::default();
        for i in 0..LEN {
            assert_eq!(0, registers.gpr(Specifier::from_u5(i)));
        }
        for i in 0..LEN {
            registers.set_gpr(Specifier::from_u5(i), i as u32 + 1);
        }
        for i in 0..LEN {
            assert_eq!(i as u32 + 1, registers.gpr(Specifier::from_u5(i)));
        }
    }

    #[test]
    fn test_wrapping_next() {
        assert_eq!(Specifier::R1, Specifier::R0.wrapping_next());
        assert_eq!(Specifier::R0, Specifier::R31.wrapping_next());
        let mut s = Specifier::R0;
        for _ in 0..32 {
            s = s.wrapping_next();
        }
        assert_eq!(Specifier::R0, s);
    }
}

//! Functional model of a 32-bit PowerPC integer core.
//!
//! The crate models architectural state (general purpose registers, CR, XER, LR, CTR, the
//! program counter, and a small set of SPRs) and the semantics of the integer instruction set.
//! Instruction fetch and decoding of raw instruction words are left to the host: execution
//! starts from the decoded [`instruction::Instruction`] representation.
//!
//! Memory is reached through the byte-level [`bus::Bus`] trait, so the host decides how the
//! address space is laid out. [`ram::Ram`] is a ready-made flat implementation for simple hosts
//! and for tests.

#[macro_use]
extern crate static_assertions;

pub mod bits;
pub mod branch;
pub mod bus;
pub mod condition;
pub mod core;
pub mod instruction;
pub mod ram;
pub mod registers;
pub mod sprs;
pub mod xer;

pub mod unit {
    //! Collection of the units in which memory can be addressed (in bytes).

    /// A _byte_ is 8 bits.
    pub const BYTE: u32 = 1;

    /// A _halfword_ is 16 bits (2 bytes).
    pub const HALFWORD: u32 = 2;

    /// A _word_ is 32 bits (4 bytes).
    pub const WORD: u32 = 4;
}

/// The size of every instruction, in bytes.
///
/// All instructions are one word; the program counter is advanced by this amount before an
/// instruction's semantics run, and branch instructions subtract it again to recover their own
/// address.
pub const INSTRUCTION_SIZE: u32 = unit::WORD;

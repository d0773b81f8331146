//! Decoded instruction representation.
//!
//! Decoding raw instruction words is the host's job; this is the form execution starts from.
//! Variants group mnemonics by operand shape, with the record (`.`) and overflow-enable (`o`)
//! suffixes folded into `record`/`oe` flags where the architecture defines them.

use crate::registers::Specifier;

/// Data structure that can hold any supported instruction in its decoded form.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Instruction {
    /// `addi`, `addis`, `mulli`, `subfic`: register-immediate arithmetic without flags.
    ///
    /// The 16-bit immediate is sign-extended at decode time.
    OpImm {
        op: RegImmOp,
        dest: Specifier,
        src: Specifier,
        immediate: i32,
    },
    /// `addic` and `addic.`: add immediate carrying, optionally recording to CR0.
    Addic {
        dest: Specifier,
        src: Specifier,
        immediate: i32,
        record: bool,
    },
    /// Three-register arithmetic with the full `o`/`.` suffix grid.
    Op {
        op: RegRegOp,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        oe: bool,
        record: bool,
    },
    /// Two-register arithmetic (`neg`, and the carry-in forms whose second operand is
    /// implicit: `addme`, `addze`, `subfme`, `subfze`), with the full `o`/`.` suffix grid.
    OpUnary {
        op: RegUnaryOp,
        dest: Specifier,
        src: Specifier,
        oe: bool,
        record: bool,
    },
    /// The multiply forms without an `o` variant: `mulhw`, `mulhwu`, `mullhw`, `mullhwu`.
    Mul {
        op: MulOp,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        record: bool,
    },
    /// Register-register logical and shift operations. `dest` is the rA field: these write
    /// their result to rA from rS and rB.
    Logical {
        op: LogicalOp,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        record: bool,
    },
    /// Immediate logical operations. `andi.` and `andis.` always record to CR0; the OR and
    /// XOR forms never do, so there is no flag here.
    ///
    /// `immediate` is the zero-extended 16-bit field; the `*is` forms shift it into the upper
    /// halfword during execution.
    LogicalImm {
        op: LogicalImmOp,
        dest: Specifier,
        src: Specifier,
        immediate: u32,
    },
    /// Single-source register transforms: `extsb`, `extsh`, `cntlzw`.
    Extend {
        op: ExtendOp,
        dest: Specifier,
        src: Specifier,
        record: bool,
    },
    /// `srawi`: shift right algebraic by an immediate amount, computing CA.
    Srawi {
        dest: Specifier,
        src: Specifier,
        shift: u8,
        record: bool,
    },
    /// `rlwimi`: rotate left and insert under mask.
    RotateInsertImm {
        dest: Specifier,
        src: Specifier,
        shift: u8,
        mask_begin: u8,
        mask_end: u8,
        record: bool,
    },
    /// `rlwinm`: rotate left by an immediate amount and AND with mask.
    RotateImm {
        dest: Specifier,
        src: Specifier,
        shift: u8,
        mask_begin: u8,
        mask_end: u8,
        record: bool,
    },
    /// `rlwnm`: rotate left by a register amount and AND with mask.
    RotateReg {
        dest: Specifier,
        src: Specifier,
        shift_src: Specifier,
        mask_begin: u8,
        mask_end: u8,
        record: bool,
    },
    /// `cmp`: signed register compare into CR field `crf`.
    Compare {
        crf: u8,
        src1: Specifier,
        src2: Specifier,
    },
    /// `cmpi`: signed immediate compare into CR field `crf`.
    CompareImm {
        crf: u8,
        src: Specifier,
        immediate: i32,
    },
    /// `cmpl`: unsigned register compare into CR field `crf`.
    CompareLogical {
        crf: u8,
        src1: Specifier,
        src2: Specifier,
    },
    /// `cmpli`: unsigned immediate compare into CR field `crf`.
    CompareLogicalImm {
        crf: u8,
        src: Specifier,
        immediate: u32,
    },
    /// `b`, `ba`, `bl`, `bla`: unconditional branch. `offset` is in instruction words.
    Branch {
        offset: i32,
        absolute: bool,
        link: bool,
    },
    /// `bc`, `bca`, `bcl`, `bcla`: conditional branch. `offset` is in instruction words.
    BranchCond {
        bo: u8,
        bi: u8,
        offset: i32,
        absolute: bool,
        link: bool,
    },
    /// `bcctr`, `bcctrl`: conditional branch to the count register.
    BranchCondCtr { bo: u8, bi: u8, link: bool },
    /// `bclr`, `bclrl`: conditional branch to the link register.
    BranchCondLr { bo: u8, bi: u8, link: bool },
    /// The CR-bit logical operations. All operands are CR bit indices in MSB-first numbering.
    CrOp { op: CrOp, dest: u8, src1: u8, src2: u8 },
    /// `mcrf`: copy CR field `src` to CR field `dest`.
    MoveCrField { dest: u8, src: u8 },
    /// `mcrxr`: copy XER's SO/OV/CA into CR field `crf`, then clear them in the XER.
    MoveXerToCr { crf: u8 },
    /// `mfcr`: copy the whole CR to a register.
    MoveFromCr { dest: Specifier },
    /// `mtcrf`: copy a register to the CR fields selected by `mask`.
    MoveToCrFields { mask: u8, src: Specifier },
    /// `mfspr`. `spr` is the raw 10-bit field from the encoding, with its halves still
    /// swapped; the executor decodes it.
    MoveFromSpr { dest: Specifier, spr: u16 },
    /// `mtspr`. See [`Instruction::MoveFromSpr`] for the `spr` field.
    MoveToSpr { spr: u16, src: Specifier },
    /// The displacement-form loads, including their update variants.
    Load {
        width: LoadWidth,
        dest: Specifier,
        base: Specifier,
        offset: i32,
        update: bool,
    },
    /// The indexed-form loads, including their update variants.
    LoadIndexed {
        width: LoadWidth,
        dest: Specifier,
        base: Specifier,
        index: Specifier,
        update: bool,
    },
    /// `lhbrx`, `lwbrx`: byte-reversed loads (indexed only).
    LoadReversed {
        width: ReversedWidth,
        dest: Specifier,
        base: Specifier,
        index: Specifier,
    },
    /// The displacement-form stores, including their update variants.
    Store {
        width: StoreWidth,
        src: Specifier,
        base: Specifier,
        offset: i32,
        update: bool,
    },
    /// The indexed-form stores, including their update variants.
    StoreIndexed {
        width: StoreWidth,
        src: Specifier,
        base: Specifier,
        index: Specifier,
        update: bool,
    },
    /// `sthbrx`, `stwbrx`: byte-reversed stores (indexed only).
    StoreReversed {
        width: ReversedWidth,
        src: Specifier,
        base: Specifier,
        index: Specifier,
    },
    /// `lmw`: load multiple words into `dest` up to r31.
    LoadMultiple {
        dest: Specifier,
        base: Specifier,
        offset: i32,
    },
    /// `stmw`: store multiple words from `src` up to r31.
    StoreMultiple {
        src: Specifier,
        base: Specifier,
        offset: i32,
    },
    /// `lswi`: load string immediate. `count` is the raw NB field; zero means 32 bytes.
    LoadStringImm {
        dest: Specifier,
        base: Specifier,
        count: u8,
    },
    /// `lswx`: load string indexed; the byte count comes from the XER.
    LoadStringIndexed {
        dest: Specifier,
        base: Specifier,
        index: Specifier,
    },
    /// `stswi`: store string immediate. `count` is the raw NB field; zero means 32 bytes.
    StoreStringImm {
        src: Specifier,
        base: Specifier,
        count: u8,
    },
    /// `stswx`: store string indexed; the byte count comes from the XER.
    StoreStringIndexed {
        src: Specifier,
        base: Specifier,
        index: Specifier,
    },
    /// `sc`: system call.
    Syscall,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegImmOp {
    Addi,
    Addis,
    Mulli,
    Subfic,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegRegOp {
    Add,
    Addc,
    Adde,
    Subf,
    Subfc,
    Subfe,
    Mullw,
    Divw,
    Divwu,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegUnaryOp {
    Neg,
    Addme,
    Addze,
    Subfme,
    Subfze,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MulOp {
    Mulhw,
    Mulhwu,
    Mullhw,
    Mullhwu,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LogicalOp {
    And,
    Andc,
    Or,
    Orc,
    Xor,
    Nand,
    Nor,
    Eqv,
    Slw,
    Srw,
    Sraw,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LogicalImmOp {
    /// `andi.`; always records to CR0.
    Andi,
    /// `andis.`; always records to CR0.
    Andis,
    Ori,
    Oris,
    Xori,
    Xoris,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExtendOp {
    Extsb,
    Extsh,
    Cntlzw,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CrOp {
    Crand,
    Crandc,
    Creqv,
    Crnand,
    Crnor,
    Cror,
    Crorc,
    Crxor,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadWidth {
    /// `lbz` family: byte, zero-extended.
    ByteZero,
    /// `lhz` family: halfword, zero-extended.
    HalfwordZero,
    /// `lha` family: halfword, sign-extended.
    HalfwordAlgebraic,
    /// `lwz` family: word.
    Word,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StoreWidth {
    Byte,
    Halfword,
    Word,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReversedWidth {
    Halfword,
    Word,
}

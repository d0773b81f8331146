use super::memory::{Memory, BIG_ENDIAN, LITTLE_ENDIAN};
use super::Core;
use crate::bits;
use crate::branch;
use crate::bus::Bus;
use crate::registers::Specifier;
use crate::sprs::{Spr, UnknownSprError};
use crate::INSTRUCTION_SIZE;
use log::{error, trace};

/// Suffix pair for trace lines of instructions with `o`/`.` variants.
fn suffix(oe: bool, record: bool) -> &'static str {
    match (oe, record) {
        (false, false) => "",
        (false, true) => ".",
        (true, false) => "o",
        (true, true) => "o.",
    }
}

#[derive(Debug)]
pub(super) struct Executor<'c, B: Bus> {
    pub core: &'c mut Core<B>,
}

impl<'c, B: Bus> Executor<'c, B> {
    //
    // Add/subtract family.
    //
    // All of these funnel into `add_op`, which applies the fixed side-effect order: carry
    // update, then overflow update, then the CR0 record. CR0's SO bit must observe the XER
    // after the overflow update, so this order is not negotiable.
    //

    pub fn add(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        oe: bool,
        record: bool,
    ) {
        trace!("add{} {}, {}, {}", suffix(oe, record), dest, src1, src2);
        let (a, b) = (self.gpr(src1), self.gpr(src2));
        self.add_op(dest, a, b, 0, false, oe, record);
    }

    pub fn addc(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        oe: bool,
        record: bool,
    ) {
        trace!("addc{} {}, {}, {}", suffix(oe, record), dest, src1, src2);
        let (a, b) = (self.gpr(src1), self.gpr(src2));
        self.add_op(dest, a, b, 0, true, oe, record);
    }

    /// Executes an `adde` instruction: `dest = src1 + src2 + CA`.
    ///
    /// The incoming carry participates as a third operand in both the carry and the overflow
    /// update, so those see the pre-instruction CA value.
    pub fn adde(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        oe: bool,
        record: bool,
    ) {
        trace!("adde{} {}, {}, {}", suffix(oe, record), dest, src1, src2);
        let (a, b) = (self.gpr(src1), self.gpr(src2));
        let ca = self.core.xer.ca() as u32;
        self.add_op(dest, a, b, ca, true, oe, record);
    }

    /// Executes an `addme` instruction: `dest = src + CA - 1`.
    pub fn addme(&mut self, dest: Specifier, src: Specifier, oe: bool, record: bool) {
        trace!("addme{} {}, {}", suffix(oe, record), dest, src);
        let a = self.gpr(src);
        let ca = self.core.xer.ca() as u32;
        self.add_op(dest, a, ca, 0xFFFF_FFFF, true, oe, record);
    }

    /// Executes an `addze` instruction: `dest = src + CA`.
    pub fn addze(&mut self, dest: Specifier, src: Specifier, oe: bool, record: bool) {
        trace!("addze{} {}, {}", suffix(oe, record), dest, src);
        let a = self.gpr(src);
        let ca = self.core.xer.ca() as u32;
        self.add_op(dest, a, ca, 0, true, oe, record);
    }

    /// Executes a `subf` instruction: `dest = src2 - src1`, computed as `!src1 + src2 + 1`.
    pub fn subf(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        oe: bool,
        record: bool,
    ) {
        trace!("subf{} {}, {}, {}", suffix(oe, record), dest, src1, src2);
        let (a, b) = (self.gpr(src1), self.gpr(src2));
        self.add_op(dest, !a, b, 1, false, oe, record);
    }

    /// Executes a `subfc` instruction. CA is set iff the subtraction does not borrow.
    pub fn subfc(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        oe: bool,
        record: bool,
    ) {
        trace!("subfc{} {}, {}, {}", suffix(oe, record), dest, src1, src2);
        let (a, b) = (self.gpr(src1), self.gpr(src2));
        self.add_op(dest, !a, b, 1, true, oe, record);
    }

    pub fn subfe(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        oe: bool,
        record: bool,
    ) {
        trace!("subfe{} {}, {}, {}", suffix(oe, record), dest, src1, src2);
        let (a, b) = (self.gpr(src1), self.gpr(src2));
        let ca = self.core.xer.ca() as u32;
        self.add_op(dest, !a, b, ca, true, oe, record);
    }

    pub fn subfme(&mut self, dest: Specifier, src: Specifier, oe: bool, record: bool) {
        trace!("subfme{} {}, {}", suffix(oe, record), dest, src);
        let a = self.gpr(src);
        let ca = self.core.xer.ca() as u32;
        self.add_op(dest, !a, ca, 0xFFFF_FFFF, true, oe, record);
    }

    pub fn subfze(&mut self, dest: Specifier, src: Specifier, oe: bool, record: bool) {
        trace!("subfze{} {}, {}", suffix(oe, record), dest, src);
        let a = self.gpr(src);
        let ca = self.core.xer.ca() as u32;
        self.add_op(dest, !a, ca, 0, true, oe, record);
    }

    /// Executes a `neg` instruction: `dest = -src`, computed as `!src + 1`.
    ///
    /// Overflow occurs exactly when `src` is `0x8000_0000`, which falls out of the generic
    /// add overflow check applied to the two's complement operands.
    pub fn neg(&mut self, dest: Specifier, src: Specifier, oe: bool, record: bool) {
        trace!("neg{} {}, {}", suffix(oe, record), dest, src);
        let a = self.gpr(src);
        self.add_op(dest, !a, 1, 0, false, oe, record);
    }

    /// Executes an `addi` instruction. A `src` of r0 stands for the literal zero here, making
    /// `addi dest, 0, imm` the canonical load-immediate.
    pub fn addi(&mut self, dest: Specifier, src: Specifier, immediate: i32) {
        trace!("addi {}, {}, {}", dest, src, immediate);
        let base = if src == Specifier::R0 {
            0
        } else {
            self.gpr(src)
        };
        self.set_gpr(dest, base.wrapping_add_signed(immediate));
    }

    /// Executes an `addis` instruction. The r0-as-zero rule of [`addi`](Self::addi) applies.
    pub fn addis(&mut self, dest: Specifier, src: Specifier, immediate: i32) {
        trace!("addis {}, {}, {}", dest, src, immediate);
        let base = if src == Specifier::R0 {
            0
        } else {
            self.gpr(src)
        };
        self.set_gpr(dest, base.wrapping_add((immediate as u32) << 16));
    }

    /// Executes an `addic`/`addic.` instruction. Unlike `addi`, r0 is an ordinary operand.
    pub fn addic(&mut self, dest: Specifier, src: Specifier, immediate: i32, record: bool) {
        trace!(
            "addic{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src,
            immediate
        );
        let a = self.gpr(src);
        self.add_op(dest, a, immediate as u32, 0, true, false, record);
    }

    pub fn subfic(&mut self, dest: Specifier, src: Specifier, immediate: i32) {
        trace!("subfic {}, {}, {}", dest, src, immediate);
        let a = self.gpr(src);
        self.add_op(dest, !a, immediate as u32, 1, true, false, false);
    }

    //
    // Multiply and divide.
    //

    pub fn mulli(&mut self, dest: Specifier, src: Specifier, immediate: i32) {
        trace!("mulli {}, {}, {}", dest, src, immediate);
        let product = self.gpr(src) as i32 as i64 * immediate as i64;
        self.set_gpr(dest, product as u32);
    }

    /// Executes a `mullw` instruction. The `o` form checks the full 64-bit product against
    /// its 32-bit truncation, which is a different overflow condition than the add family's.
    pub fn mullw(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        oe: bool,
        record: bool,
    ) {
        trace!("mullw{} {}, {}, {}", suffix(oe, record), dest, src1, src2);
        let product = self.gpr(src1) as i32 as i64 * self.gpr(src2) as i32 as i64;
        let result = product as u32;
        if oe {
            self.core.xer.update_overflow_mul(product);
        }
        self.record_if(record, result);
        self.set_gpr(dest, result);
    }

    pub fn mulhw(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "mulhw{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        let product = self.gpr(src1) as i32 as i64 * self.gpr(src2) as i32 as i64;
        let result = (product as u64 >> 32) as u32;
        self.record_if(record, result);
        self.set_gpr(dest, result);
    }

    pub fn mulhwu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "mulhwu{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        let product = self.gpr(src1) as u64 * self.gpr(src2) as u64;
        let result = (product >> 32) as u32;
        self.record_if(record, result);
        self.set_gpr(dest, result);
    }

    /// Executes a `mullhw` instruction: signed product of the low halfwords.
    pub fn mullhw(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "mullhw{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        let result =
            (self.gpr(src1) as u16 as i16 as i32).wrapping_mul(self.gpr(src2) as u16 as i16 as i32)
                as u32;
        self.record_if(record, result);
        self.set_gpr(dest, result);
    }

    pub fn mullhwu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "mullhwu{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        let result = (self.gpr(src1) as u16 as u32).wrapping_mul(self.gpr(src2) as u16 as u32);
        self.record_if(record, result);
        self.set_gpr(dest, result);
    }

    /// Executes a `divw` instruction.
    ///
    /// Division by zero deterministically yields 0; the `o` form reports it (and the one
    /// unrepresentable quotient, `i32::MIN / -1`) as overflow.
    pub fn divw(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        oe: bool,
        record: bool,
    ) {
        trace!("divw{} {}, {}, {}", suffix(oe, record), dest, src1, src2);
        let (a, b) = (self.gpr(src1), self.gpr(src2));
        let result = if b == 0 {
            0
        } else {
            (a as i32 as i64 / b as i32 as i64) as u32
        };
        if oe {
            self.core.xer.update_overflow_div_signed(result, a, b);
        }
        self.record_if(record, result);
        self.set_gpr(dest, result);
    }

    /// Executes a `divwu` instruction. Division by zero yields 0, as for `divw`.
    pub fn divwu(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        oe: bool,
        record: bool,
    ) {
        trace!("divwu{} {}, {}, {}", suffix(oe, record), dest, src1, src2);
        let (a, b) = (self.gpr(src1), self.gpr(src2));
        let result = if b == 0 { 0 } else { a / b };
        if oe {
            self.core.xer.update_overflow_div_unsigned(result, a, b);
        }
        self.record_if(record, result);
        self.set_gpr(dest, result);
    }

    //
    // Logical operations. These write to the rA field, so `dest` is the second assembly
    // operand: `and ra, rs, rb`.
    //

    pub fn and(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "and{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        self.logical_op(dest, src1, src2, record, |rs, rb| rs & rb)
    }

    pub fn andc(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "andc{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        self.logical_op(dest, src1, src2, record, |rs, rb| rs & !rb)
    }

    pub fn or(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "or{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        self.logical_op(dest, src1, src2, record, |rs, rb| rs | rb)
    }

    pub fn orc(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "orc{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        self.logical_op(dest, src1, src2, record, |rs, rb| rs | !rb)
    }

    pub fn xor(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "xor{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        self.logical_op(dest, src1, src2, record, |rs, rb| rs ^ rb)
    }

    pub fn nand(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "nand{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        self.logical_op(dest, src1, src2, record, |rs, rb| !(rs & rb))
    }

    pub fn nor(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "nor{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        self.logical_op(dest, src1, src2, record, |rs, rb| !(rs | rb))
    }

    pub fn eqv(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "eqv{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        self.logical_op(dest, src1, src2, record, |rs, rb| !(rs ^ rb))
    }

    /// Executes a `slw` instruction. Shift amounts of 32 and above (rB bit 26 set) produce 0.
    pub fn slw(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "slw{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        self.logical_op(dest, src1, src2, record, |rs, rb| {
            let n = rb & 0x1F;
            if rb & 0x20 == 0 {
                rs.rotate_left(n) & bits::mask_range(0, 31 - n)
            } else {
                0
            }
        })
    }

    /// Executes a `srw` instruction. Shift amounts of 32 and above produce 0.
    pub fn srw(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "srw{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        self.logical_op(dest, src1, src2, record, |rs, rb| {
            let n = rb & 0x1F;
            if rb & 0x20 == 0 {
                rs.rotate_right(n) & bits::mask_range(n, 31)
            } else {
                0
            }
        })
    }

    /// Executes a `sraw` instruction.
    ///
    /// CA is set iff the source is negative and any one bits were shifted out, in which case
    /// the truncated result underestimates the true arithmetic shift.
    pub fn sraw(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool) {
        trace!(
            "sraw{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src1,
            src2
        );
        let rs = self.gpr(src1);
        let rb = self.gpr(src2);
        let n = rb & 0x1F;
        let mask = if rb & 0x20 == 0 {
            bits::mask_range(n, 31)
        } else {
            0
        };
        self.shift_right_algebraic(dest, rs, n, mask, record);
    }

    /// Executes a `srawi` instruction. See [`sraw`](Self::sraw) for the CA contract.
    pub fn srawi(&mut self, dest: Specifier, src: Specifier, shift: u8, record: bool) {
        trace!(
            "srawi{} {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src,
            shift
        );
        let rs = self.gpr(src);
        let n = shift as u32;
        let mask = bits::mask_range(n, 31);
        self.shift_right_algebraic(dest, rs, n, mask, record);
    }

    //
    // Immediate logical operations. The `*is` forms shift the 16-bit immediate into the
    // upper halfword; `andi.`/`andis.` always record to CR0.
    //

    pub fn andi(&mut self, dest: Specifier, src: Specifier, immediate: u32) {
        trace!("andi. {}, {}, {}", dest, src, immediate);
        let result = self.gpr(src) & immediate;
        self.set_gpr(dest, result);
        self.record(result);
    }

    pub fn andis(&mut self, dest: Specifier, src: Specifier, immediate: u32) {
        trace!("andis. {}, {}, {}", dest, src, immediate);
        let result = self.gpr(src) & (immediate << 16);
        self.set_gpr(dest, result);
        self.record(result);
    }

    pub fn ori(&mut self, dest: Specifier, src: Specifier, immediate: u32) {
        trace!("ori {}, {}, {}", dest, src, immediate);
        let result = self.gpr(src) | immediate;
        self.set_gpr(dest, result);
    }

    pub fn oris(&mut self, dest: Specifier, src: Specifier, immediate: u32) {
        trace!("oris {}, {}, {}", dest, src, immediate);
        let result = self.gpr(src) | (immediate << 16);
        self.set_gpr(dest, result);
    }

    pub fn xori(&mut self, dest: Specifier, src: Specifier, immediate: u32) {
        trace!("xori {}, {}, {}", dest, src, immediate);
        let result = self.gpr(src) ^ immediate;
        self.set_gpr(dest, result);
    }

    pub fn xoris(&mut self, dest: Specifier, src: Specifier, immediate: u32) {
        trace!("xoris {}, {}, {}", dest, src, immediate);
        let result = self.gpr(src) ^ (immediate << 16);
        self.set_gpr(dest, result);
    }

    pub fn extsb(&mut self, dest: Specifier, src: Specifier, record: bool) {
        trace!("extsb{} {}, {}", if record { "." } else { "" }, dest, src);
        let result = self.gpr(src) as i8 as u32;
        self.set_gpr(dest, result);
        self.record_if(record, result);
    }

    pub fn extsh(&mut self, dest: Specifier, src: Specifier, record: bool) {
        trace!("extsh{} {}, {}", if record { "." } else { "" }, dest, src);
        let result = self.gpr(src) as i16 as u32;
        self.set_gpr(dest, result);
        self.record_if(record, result);
    }

    pub fn cntlzw(&mut self, dest: Specifier, src: Specifier, record: bool) {
        trace!("cntlzw{} {}, {}", if record { "." } else { "" }, dest, src);
        let result = self.gpr(src).leading_zeros();
        self.set_gpr(dest, result);
        self.record_if(record, result);
    }

    //
    // Rotate-and-mask.
    //

    /// Executes a `rlwimi` instruction: rotated source bits are inserted into `dest` under
    /// the mask, the rest of `dest` is preserved.
    pub fn rlwimi(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift: u8,
        mask_begin: u8,
        mask_end: u8,
        record: bool,
    ) {
        trace!(
            "rlwimi{} {}, {}, {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src,
            shift,
            mask_begin,
            mask_end
        );
        let rotated = self.gpr(src).rotate_left(shift as u32);
        let mask = bits::mask_range(mask_begin as u32, mask_end as u32);
        let result = (rotated & mask) | (self.gpr(dest) & !mask);
        self.set_gpr(dest, result);
        self.record_if(record, result);
    }

    pub fn rlwinm(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift: u8,
        mask_begin: u8,
        mask_end: u8,
        record: bool,
    ) {
        trace!(
            "rlwinm{} {}, {}, {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src,
            shift,
            mask_begin,
            mask_end
        );
        let result = self.gpr(src).rotate_left(shift as u32)
            & bits::mask_range(mask_begin as u32, mask_end as u32);
        self.set_gpr(dest, result);
        self.record_if(record, result);
    }

    /// Executes a `rlwnm` instruction. The rotate amount is the low five bits of the shift
    /// source register.
    pub fn rlwnm(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_src: Specifier,
        mask_begin: u8,
        mask_end: u8,
        record: bool,
    ) {
        trace!(
            "rlwnm{} {}, {}, {}, {}, {}",
            if record { "." } else { "" },
            dest,
            src,
            shift_src,
            mask_begin,
            mask_end
        );
        let amount = self.gpr(shift_src) & 0x1F;
        let result = self.gpr(src).rotate_left(amount)
            & bits::mask_range(mask_begin as u32, mask_end as u32);
        self.set_gpr(dest, result);
        self.record_if(record, result);
    }

    //
    // Compares. These write LT/GT/EQ from the comparison and SO from the current XER into
    // the targeted CR field.
    //

    pub fn cmp(&mut self, crf: u8, src1: Specifier, src2: Specifier) {
        trace!("cmp crf{}, 0, {}, {}", crf, src1, src2);
        let (a, b) = (self.gpr(src1) as i32, self.gpr(src2) as i32);
        self.write_compare_field(crf, a < b, a > b, a == b);
    }

    pub fn cmpi(&mut self, crf: u8, src: Specifier, immediate: i32) {
        trace!("cmpi crf{}, 0, {}, {}", crf, src, immediate);
        let a = self.gpr(src) as i32;
        self.write_compare_field(crf, a < immediate, a > immediate, a == immediate);
    }

    pub fn cmpl(&mut self, crf: u8, src1: Specifier, src2: Specifier) {
        trace!("cmpl crf{}, 0, {}, {}", crf, src1, src2);
        let (a, b) = (self.gpr(src1), self.gpr(src2));
        self.write_compare_field(crf, a < b, a > b, a == b);
    }

    pub fn cmpli(&mut self, crf: u8, src: Specifier, immediate: u32) {
        trace!("cmpli crf{}, 0, {}, {}", crf, src, immediate);
        let a = self.gpr(src);
        self.write_compare_field(crf, a < immediate, a > immediate, a == immediate);
    }

    //
    // Branches. The PC has already been advanced past the branch, so the instruction's own
    // address is `pc - INSTRUCTION_SIZE`; displacements are relative to that address, and the
    // link register receives the address of the following instruction.
    //

    pub fn b(&mut self, offset: i32, absolute: bool, link: bool) {
        trace!(
            "b{}{} {}",
            if link { "l" } else { "" },
            if absolute { "a" } else { "" },
            offset
        );
        let ia = self.core.registers.pc().wrapping_sub(INSTRUCTION_SIZE);
        let displacement = (offset as u32).wrapping_shl(2);
        let nia = if absolute {
            displacement
        } else {
            ia.wrapping_add(displacement)
        };
        if link {
            self.core.sprs.lr = ia.wrapping_add(INSTRUCTION_SIZE);
        }
        *self.core.registers.pc_mut() = nia;
    }

    /// Executes a `bc` instruction.
    ///
    /// The CTR write-back and, when `link` is set, the LR update happen whether or not the
    /// branch is taken.
    pub fn bc(&mut self, bo: u8, bi: u8, offset: i32, absolute: bool, link: bool) {
        trace!(
            "bc{}{} {}, {}, {}",
            if link { "l" } else { "" },
            if absolute { "a" } else { "" },
            bo,
            bi,
            offset
        );
        let ia = self.core.registers.pc().wrapping_sub(INSTRUCTION_SIZE);
        let decision = branch::resolve(bo, bi, &self.core.cr, self.core.sprs.ctr);
        self.core.sprs.ctr = decision.ctr;

        let nia = if decision.taken {
            let displacement = (offset as u32).wrapping_shl(2);
            if absolute {
                displacement
            } else {
                ia.wrapping_add(displacement)
            }
        } else {
            ia.wrapping_add(INSTRUCTION_SIZE)
        };
        if link {
            self.core.sprs.lr = ia.wrapping_add(INSTRUCTION_SIZE);
        }
        *self.core.registers.pc_mut() = nia;
    }

    /// Executes a `bcctr` instruction. The target is the CTR *after* any BO-requested
    /// decrement, with its low two bits cleared.
    pub fn bcctr(&mut self, bo: u8, bi: u8, link: bool) {
        trace!("bcctr{} {}, {}", if link { "l" } else { "" }, bo, bi);
        let ia = self.core.registers.pc().wrapping_sub(INSTRUCTION_SIZE);
        let decision = branch::resolve(bo, bi, &self.core.cr, self.core.sprs.ctr);
        self.core.sprs.ctr = decision.ctr;

        let nia = if decision.taken {
            decision.ctr & !0x3
        } else {
            ia.wrapping_add(INSTRUCTION_SIZE)
        };
        if link {
            self.core.sprs.lr = ia.wrapping_add(INSTRUCTION_SIZE);
        }
        *self.core.registers.pc_mut() = nia;
    }

    /// Executes a `bclr` instruction. The target is the LR value from before the link
    /// update, with its low two bits cleared.
    pub fn bclr(&mut self, bo: u8, bi: u8, link: bool) {
        trace!("bclr{} {}, {}", if link { "l" } else { "" }, bo, bi);
        let ia = self.core.registers.pc().wrapping_sub(INSTRUCTION_SIZE);
        let decision = branch::resolve(bo, bi, &self.core.cr, self.core.sprs.ctr);
        self.core.sprs.ctr = decision.ctr;

        let nia = if decision.taken {
            self.core.sprs.lr & !0x3
        } else {
            ia.wrapping_add(INSTRUCTION_SIZE)
        };
        if link {
            self.core.sprs.lr = ia.wrapping_add(INSTRUCTION_SIZE);
        }
        *self.core.registers.pc_mut() = nia;
    }

    //
    // CR-bit and CR-field operations.
    //

    pub fn crand(&mut self, dest: u8, src1: u8, src2: u8) {
        trace!("crand {}, {}, {}", dest, src1, src2);
        self.cr_bit_op(dest, src1, src2, |a, b| a & b)
    }

    pub fn crandc(&mut self, dest: u8, src1: u8, src2: u8) {
        trace!("crandc {}, {}, {}", dest, src1, src2);
        self.cr_bit_op(dest, src1, src2, |a, b| a & !b)
    }

    pub fn creqv(&mut self, dest: u8, src1: u8, src2: u8) {
        trace!("creqv {}, {}, {}", dest, src1, src2);
        self.cr_bit_op(dest, src1, src2, |a, b| a == b)
    }

    pub fn crnand(&mut self, dest: u8, src1: u8, src2: u8) {
        trace!("crnand {}, {}, {}", dest, src1, src2);
        self.cr_bit_op(dest, src1, src2, |a, b| !(a & b))
    }

    pub fn crnor(&mut self, dest: u8, src1: u8, src2: u8) {
        trace!("crnor {}, {}, {}", dest, src1, src2);
        self.cr_bit_op(dest, src1, src2, |a, b| !(a | b))
    }

    pub fn cror(&mut self, dest: u8, src1: u8, src2: u8) {
        trace!("cror {}, {}, {}", dest, src1, src2);
        self.cr_bit_op(dest, src1, src2, |a, b| a | b)
    }

    pub fn crorc(&mut self, dest: u8, src1: u8, src2: u8) {
        trace!("crorc {}, {}, {}", dest, src1, src2);
        self.cr_bit_op(dest, src1, src2, |a, b| a | !b)
    }

    pub fn crxor(&mut self, dest: u8, src1: u8, src2: u8) {
        trace!("crxor {}, {}, {}", dest, src1, src2);
        self.cr_bit_op(dest, src1, src2, |a, b| a ^ b)
    }

    pub fn mcrf(&mut self, dest: u8, src: u8) {
        trace!("mcrf {}, {}", dest, src);
        let value = self.core.cr.field(src);
        self.core.cr.set_field(dest, value);
    }

    /// Executes a `mcrxr` instruction: SO, OV, and CA move into the high three bits of the
    /// selected CR field, then are cleared in the XER. Other CR fields are untouched.
    pub fn mcrxr(&mut self, crf: u8) {
        trace!("mcrxr {}", crf);
        let xer = &mut self.core.xer;
        let field = ((xer.so() as u8) << 3) | ((xer.ov() as u8) << 2) | ((xer.ca() as u8) << 1);
        xer.set_so(false);
        xer.set_ov(false);
        xer.set_ca(false);
        self.core.cr.set_field(crf, field);
    }

    pub fn mfcr(&mut self, dest: Specifier) {
        trace!("mfcr {}", dest);
        let value = self.core.cr.read();
        self.set_gpr(dest, value);
    }

    pub fn mtcrf(&mut self, mask: u8, src: Specifier) {
        trace!("mtcrf {}, {}", mask, src);
        let mask = bits::crm_mask(mask);
        let value = (self.gpr(src) & mask) | (self.core.cr.read() & !mask);
        self.core.cr.write(value);
    }

    //
    // SPR moves. An SPR field that does not decode to an implemented register is fatal: the
    // model has no way to continue meaningfully, so it reports and exits the process.
    //

    pub fn mfspr(&mut self, dest: Specifier, spr_field: u16) {
        match Spr::decode(spr_field) {
            Ok(spr) => {
                trace!("mfspr {}, {}", dest, spr);
                let value = self.core.sprs.read(spr);
                self.set_gpr(dest, value);
            }
            Err(error) => self.unknown_spr(error),
        }
    }

    pub fn mtspr(&mut self, spr_field: u16, src: Specifier) {
        match Spr::decode(spr_field) {
            Ok(spr) => {
                trace!("mtspr {}, {}", spr, src);
                let value = self.gpr(src);
                self.core.sprs.write(spr, value);
            }
            Err(error) => self.unknown_spr(error),
        }
    }

    //
    // Loads. The non-update forms treat a base of r0 as zero; the update forms always use
    // the register value and write the effective address back to the base register, before
    // the destination register is written.
    //

    pub fn lbz(&mut self, dest: Specifier, base: Specifier, offset: i32, update: bool) {
        trace!(
            "lbz{} {}, {}({})",
            if update { "u" } else { "" },
            dest,
            offset,
            base
        );
        let ea = self.effective_address(base, offset, update);
        self.load_op(dest, base, ea, update, |memory, ea| {
            memory.read_byte(ea) as u32
        });
    }

    pub fn lhz(&mut self, dest: Specifier, base: Specifier, offset: i32, update: bool) {
        trace!(
            "lhz{} {}, {}({})",
            if update { "u" } else { "" },
            dest,
            offset,
            base
        );
        let ea = self.effective_address(base, offset, update);
        self.load_op(dest, base, ea, update, |memory, ea| {
            memory.read_halfword::<BIG_ENDIAN>(ea) as u32
        });
    }

    pub fn lha(&mut self, dest: Specifier, base: Specifier, offset: i32, update: bool) {
        trace!(
            "lha{} {}, {}({})",
            if update { "u" } else { "" },
            dest,
            offset,
            base
        );
        let ea = self.effective_address(base, offset, update);
        self.load_op(dest, base, ea, update, |memory, ea| {
            memory.read_halfword::<BIG_ENDIAN>(ea) as i16 as u32
        });
    }

    pub fn lwz(&mut self, dest: Specifier, base: Specifier, offset: i32, update: bool) {
        trace!(
            "lwz{} {}, {}({})",
            if update { "u" } else { "" },
            dest,
            offset,
            base
        );
        let ea = self.effective_address(base, offset, update);
        self.load_op(dest, base, ea, update, |memory, ea| {
            memory.read_word::<BIG_ENDIAN>(ea)
        });
    }

    pub fn lbzx(&mut self, dest: Specifier, base: Specifier, index: Specifier, update: bool) {
        trace!(
            "lbz{}x {}, {}, {}",
            if update { "u" } else { "" },
            dest,
            base,
            index
        );
        let ea = self.effective_address_indexed(base, index, update);
        self.load_op(dest, base, ea, update, |memory, ea| {
            memory.read_byte(ea) as u32
        });
    }

    pub fn lhzx(&mut self, dest: Specifier, base: Specifier, index: Specifier, update: bool) {
        trace!(
            "lhz{}x {}, {}, {}",
            if update { "u" } else { "" },
            dest,
            base,
            index
        );
        let ea = self.effective_address_indexed(base, index, update);
        self.load_op(dest, base, ea, update, |memory, ea| {
            memory.read_halfword::<BIG_ENDIAN>(ea) as u32
        });
    }

    pub fn lhax(&mut self, dest: Specifier, base: Specifier, index: Specifier, update: bool) {
        trace!(
            "lha{}x {}, {}, {}",
            if update { "u" } else { "" },
            dest,
            base,
            index
        );
        let ea = self.effective_address_indexed(base, index, update);
        self.load_op(dest, base, ea, update, |memory, ea| {
            memory.read_halfword::<BIG_ENDIAN>(ea) as i16 as u32
        });
    }

    pub fn lwzx(&mut self, dest: Specifier, base: Specifier, index: Specifier, update: bool) {
        trace!(
            "lwz{}x {}, {}, {}",
            if update { "u" } else { "" },
            dest,
            base,
            index
        );
        let ea = self.effective_address_indexed(base, index, update);
        self.load_op(dest, base, ea, update, |memory, ea| {
            memory.read_word::<BIG_ENDIAN>(ea)
        });
    }

    pub fn lhbrx(&mut self, dest: Specifier, base: Specifier, index: Specifier) {
        trace!("lhbrx {}, {}, {}", dest, base, index);
        let ea = self.effective_address_indexed(base, index, false);
        self.load_op(dest, base, ea, false, |memory, ea| {
            memory.read_halfword::<LITTLE_ENDIAN>(ea) as u32
        });
    }

    pub fn lwbrx(&mut self, dest: Specifier, base: Specifier, index: Specifier) {
        trace!("lwbrx {}, {}, {}", dest, base, index);
        let ea = self.effective_address_indexed(base, index, false);
        self.load_op(dest, base, ea, false, |memory, ea| {
            memory.read_word::<LITTLE_ENDIAN>(ea)
        });
    }

    //
    // Stores.
    //

    pub fn stb(&mut self, src: Specifier, base: Specifier, offset: i32, update: bool) {
        trace!(
            "stb{} {}, {}({})",
            if update { "u" } else { "" },
            src,
            offset,
            base
        );
        let ea = self.effective_address(base, offset, update);
        let value = self.gpr(src);
        Memory::new(&mut self.core.bus).write_byte(ea, value as u8);
        self.update_base(base, ea, update);
    }

    pub fn sth(&mut self, src: Specifier, base: Specifier, offset: i32, update: bool) {
        trace!(
            "sth{} {}, {}({})",
            if update { "u" } else { "" },
            src,
            offset,
            base
        );
        let ea = self.effective_address(base, offset, update);
        let value = self.gpr(src);
        Memory::new(&mut self.core.bus).write_halfword::<BIG_ENDIAN>(ea, value as u16);
        self.update_base(base, ea, update);
    }

    pub fn stw(&mut self, src: Specifier, base: Specifier, offset: i32, update: bool) {
        trace!(
            "stw{} {}, {}({})",
            if update { "u" } else { "" },
            src,
            offset,
            base
        );
        let ea = self.effective_address(base, offset, update);
        let value = self.gpr(src);
        Memory::new(&mut self.core.bus).write_word::<BIG_ENDIAN>(ea, value);
        self.update_base(base, ea, update);
    }

    pub fn stbx(&mut self, src: Specifier, base: Specifier, index: Specifier, update: bool) {
        trace!(
            "stb{}x {}, {}, {}",
            if update { "u" } else { "" },
            src,
            base,
            index
        );
        let ea = self.effective_address_indexed(base, index, update);
        let value = self.gpr(src);
        Memory::new(&mut self.core.bus).write_byte(ea, value as u8);
        self.update_base(base, ea, update);
    }

    pub fn sthx(&mut self, src: Specifier, base: Specifier, index: Specifier, update: bool) {
        trace!(
            "sth{}x {}, {}, {}",
            if update { "u" } else { "" },
            src,
            base,
            index
        );
        let ea = self.effective_address_indexed(base, index, update);
        let value = self.gpr(src);
        Memory::new(&mut self.core.bus).write_halfword::<BIG_ENDIAN>(ea, value as u16);
        self.update_base(base, ea, update);
    }

    pub fn stwx(&mut self, src: Specifier, base: Specifier, index: Specifier, update: bool) {
        trace!(
            "stw{}x {}, {}, {}",
            if update { "u" } else { "" },
            src,
            base,
            index
        );
        let ea = self.effective_address_indexed(base, index, update);
        let value = self.gpr(src);
        Memory::new(&mut self.core.bus).write_word::<BIG_ENDIAN>(ea, value);
        self.update_base(base, ea, update);
    }

    pub fn sthbrx(&mut self, src: Specifier, base: Specifier, index: Specifier) {
        trace!("sthbrx {}, {}, {}", src, base, index);
        let ea = self.effective_address_indexed(base, index, false);
        let value = self.gpr(src);
        Memory::new(&mut self.core.bus).write_halfword::<LITTLE_ENDIAN>(ea, value as u16);
    }

    pub fn stwbrx(&mut self, src: Specifier, base: Specifier, index: Specifier) {
        trace!("stwbrx {}, {}, {}", src, base, index);
        let ea = self.effective_address_indexed(base, index, false);
        let value = self.gpr(src);
        Memory::new(&mut self.core.bus).write_word::<LITTLE_ENDIAN>(ea, value);
    }

    //
    // Load/store multiple and string forms.
    //

    /// Executes a `lmw` instruction, loading consecutive words into `dest` up to r31.
    ///
    /// The base register is skipped (its loaded value is discarded) so the addressing base
    /// survives the loop, except when the base is r31 itself.
    pub fn lmw(&mut self, dest: Specifier, base: Specifier, offset: i32) {
        trace!("lmw {}, {}({})", dest, offset, base);
        let mut ea = self.effective_address(base, offset, false);
        for r in u8::from(dest)..=31 {
            if r != u8::from(base) || r == 31 {
                let value = Memory::new(&mut self.core.bus).read_word::<BIG_ENDIAN>(ea);
                self.core.registers.set_gpr(Specifier::from_u5(r), value);
            }
            ea = ea.wrapping_add(4);
        }
    }

    pub fn stmw(&mut self, src: Specifier, base: Specifier, offset: i32) {
        trace!("stmw {}, {}({})", src, offset, base);
        let mut ea = self.effective_address(base, offset, false);
        for r in u8::from(src)..=31 {
            let value = self.gpr(Specifier::from_u5(r));
            Memory::new(&mut self.core.bus).write_word::<BIG_ENDIAN>(ea, value);
            ea = ea.wrapping_add(4);
        }
    }

    /// Executes a `lswi` instruction. A `count` of 0 means 32 bytes; the effective address
    /// is the base register alone (r0 reading as zero), with no displacement.
    pub fn lswi(&mut self, dest: Specifier, base: Specifier, count: u8) {
        trace!("lswi {}, {}, {}", dest, base, count);
        let ea = if base == Specifier::R0 {
            0
        } else {
            self.gpr(base)
        };
        let count = if count == 0 { 32 } else { count as u32 };
        self.load_string(dest, ea, count, base, None);
    }

    /// Executes a `lswx` instruction; the byte count is the XER's transfer byte count.
    pub fn lswx(&mut self, dest: Specifier, base: Specifier, index: Specifier) {
        trace!("lswx {}, {}, {}", dest, base, index);
        let ea = self.effective_address_indexed(base, index, false);
        let count = self.core.xer.byte_count();
        self.load_string(dest, ea, count, base, Some(index));
    }

    pub fn stswi(&mut self, src: Specifier, base: Specifier, count: u8) {
        trace!("stswi {}, {}, {}", src, base, count);
        let ea = if base == Specifier::R0 {
            0
        } else {
            self.gpr(base)
        };
        let count = if count == 0 { 32 } else { count as u32 };
        self.store_string(src, ea, count);
    }

    pub fn stswx(&mut self, src: Specifier, base: Specifier, index: Specifier) {
        trace!("stswx {}, {}, {}", src, base, index);
        let ea = self.effective_address_indexed(base, index, false);
        let count = self.core.xer.byte_count();
        self.store_string(src, ea, count);
    }

    //
    // System call.
    //

    /// Executes a `sc` instruction.
    ///
    /// This path is deliberately partial: it saves the MSR to SRR1 and the return address to
    /// SRR0, sets the MSR's exception-related bits, and jumps to the system-call vector
    /// derived from the EVPR. Hosts intercepting system calls will usually do so before this
    /// runs.
    pub fn sc(&mut self) {
        trace!("sc");
        self.core.sprs.srr1 = self.core.sprs.msr;
        self.core.sprs.msr |= 0xFFFB_3FCF;
        self.core.sprs.srr0 = self.core.registers.pc();
        *self.core.registers.pc_mut() = (self.core.sprs.evpr & 0xFFFF_0000) | 0x0000_0C00;
    }

    //
    // Private helpers.
    //

    fn gpr(&self, specifier: Specifier) -> u32 {
        self.core.registers.gpr(specifier)
    }

    fn set_gpr(&mut self, specifier: Specifier, value: u32) {
        self.core.registers.set_gpr(specifier, value);
    }

    /// Updates CR0 from `result` and the current (possibly just-updated) XER SO bit.
    fn record(&mut self, result: u32) {
        let so = self.core.xer.so();
        self.core.cr.update_field0(result, so);
    }

    fn record_if(&mut self, record: bool, result: u32) {
        if record {
            self.record(result);
        }
    }

    /// Shared tail of the add/subtract family: computes `s1 + s2 + s3`, applies the optional
    /// carry, overflow, and CR0 updates in that order, and writes the destination register.
    fn add_op(
        &mut self,
        dest: Specifier,
        s1: u32,
        s2: u32,
        s3: u32,
        carry: bool,
        oe: bool,
        record: bool,
    ) {
        let result = s1.wrapping_add(s2).wrapping_add(s3);
        if carry {
            self.core.xer.update_carry_add(s1, s2, s3);
        }
        if oe {
            self.core.xer.update_overflow_add(result, s1, s2, s3);
        }
        self.record_if(record, result);
        self.set_gpr(dest, result);
    }

    #[inline]
    fn logical_op<F>(&mut self, dest: Specifier, src1: Specifier, src2: Specifier, record: bool, f: F)
    where
        F: FnOnce(u32, u32) -> u32,
    {
        let result = f(self.gpr(src1), self.gpr(src2));
        self.set_gpr(dest, result);
        self.record_if(record, result);
    }

    /// Shared tail of `sraw`/`srawi`: `mask` selects the bits kept from the rotated source,
    /// the rest fill with the sign.
    fn shift_right_algebraic(
        &mut self,
        dest: Specifier,
        rs: u32,
        amount: u32,
        mask: u32,
        record: bool,
    ) {
        let rotated = rs.rotate_right(amount);
        let sign = if rs & 0x8000_0000 != 0 {
            0xFFFF_FFFF
        } else {
            0
        };
        let result = (rotated & mask) | (sign & !mask);
        self.set_gpr(dest, result);
        self.core
            .xer
            .set_ca(sign != 0 && (rotated & !mask) != 0);
        self.record_if(record, result);
    }

    fn write_compare_field(&mut self, crf: u8, lt: bool, gt: bool, eq: bool) {
        let field = ((lt as u8) << 3)
            | ((gt as u8) << 2)
            | ((eq as u8) << 1)
            | self.core.xer.so() as u8;
        self.core.cr.set_field(crf, field);
    }

    #[inline]
    fn cr_bit_op<F>(&mut self, dest: u8, src1: u8, src2: u8, f: F)
    where
        F: FnOnce(bool, bool) -> bool,
    {
        let a = self.core.cr.bit(src1);
        let b = self.core.cr.bit(src2);
        self.core.cr.set_bit(dest, f(a, b));
    }

    /// Computes the effective address of a displacement-form access. In non-update forms a
    /// base of r0 contributes zero.
    fn effective_address(&self, base: Specifier, offset: i32, update: bool) -> u32 {
        if !update && base == Specifier::R0 {
            offset as u32
        } else {
            self.gpr(base).wrapping_add_signed(offset)
        }
    }

    /// Computes the effective address of an indexed-form access. In non-update forms a base
    /// of r0 contributes zero.
    fn effective_address_indexed(&self, base: Specifier, index: Specifier, update: bool) -> u32 {
        if !update && base == Specifier::R0 {
            self.gpr(index)
        } else {
            self.gpr(base).wrapping_add(self.gpr(index))
        }
    }

    /// Shared tail of the loads. The base write-back of update forms happens before the
    /// destination write, so the destination wins when both name the same register.
    fn load_op<F>(&mut self, dest: Specifier, base: Specifier, ea: u32, update: bool, read: F)
    where
        F: FnOnce(&Memory<'_, B>, u32) -> u32,
    {
        let value = read(&Memory::new(&mut self.core.bus), ea);
        if update {
            self.core.registers.set_gpr(base, ea);
        }
        self.core.registers.set_gpr(dest, value);
    }

    fn update_base(&mut self, base: Specifier, ea: u32, update: bool) {
        if update {
            self.core.registers.set_gpr(base, ea);
        }
    }

    /// Shared body of `lswi`/`lswx`: loads `count` bytes into consecutive registers starting
    /// at `dest`, packing MSB-first and wrapping from r31 to r0.
    ///
    /// Registers used for addressing are skipped so the address computation stays intact,
    /// except for the final register of the transfer, which is always written.
    fn load_string(
        &mut self,
        dest: Specifier,
        mut ea: u32,
        count: u32,
        base: Specifier,
        index: Option<Specifier>,
    ) {
        if count == 0 {
            return;
        }
        let rfinal = Specifier::from_u5(((u32::from(dest) + count.div_ceil(4) - 1) % 32) as u8);
        let writable = |r: Specifier| {
            let reserved = r == base || index == Some(r);
            !reserved || r == rfinal
        };

        let mut n = count;
        let mut r = dest;
        let mut i = 0;
        while n > 0 {
            if i == 0 && writable(r) {
                self.core.registers.set_gpr(r, 0);
            }
            if writable(r) {
                let byte = Memory::new(&mut self.core.bus).read_byte(ea) as u32;
                let value = (self.gpr(r) & !(0xFF00_0000 >> i)) | (byte << (24 - i));
                self.core.registers.set_gpr(r, value);
            }
            ea = ea.wrapping_add(1);
            n -= 1;
            i += 8;
            if i == 32 {
                i = 0;
                r = r.wrapping_next();
            }
        }
    }

    /// Shared body of `stswi`/`stswx`: stores `count` bytes from consecutive registers
    /// starting at `src`, MSB-first, wrapping from r31 to r0. No registers are skipped.
    fn store_string(&mut self, src: Specifier, mut ea: u32, count: u32) {
        let mut n = count;
        let mut r = src;
        let mut i = 0;
        while n > 0 {
            let byte = ((self.gpr(r) >> (24 - i)) & 0xFF) as u8;
            Memory::new(&mut self.core.bus).write_byte(ea, byte);
            ea = ea.wrapping_add(1);
            n -= 1;
            i += 8;
            if i == 32 {
                i = 0;
                r = r.wrapping_next();
            }
        }
    }

    fn unknown_spr(&mut self, error: UnknownSprError) -> ! {
        error!("{error}");
        std::process::exit(1);
    }
}

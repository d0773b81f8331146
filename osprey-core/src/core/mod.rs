//! The core itself: architectural state, configuration, and instruction dispatch.

mod debug;
mod execute;
pub mod memory;
mod syscall;

use crate::bus::Bus;
use crate::condition::ConditionRegister;
use crate::instruction::{
    CrOp, ExtendOp, Instruction, LoadWidth, LogicalImmOp, LogicalOp, MulOp, RegImmOp, RegRegOp,
    RegUnaryOp, ReversedWidth, StoreWidth,
};
use crate::registers::{Registers, Specifier};
use crate::sprs::SpecialRegisters;
use crate::xer::Xer;
use crate::INSTRUCTION_SIZE;
use execute::Executor;
use log::debug;
use memory::Memory;

/// Default size of the stack region reserved per core, in bytes (512 KiB).
pub const DEFAULT_STACK_SIZE: u32 = 0x0008_0000;

/// Number of bytes kept free between the top of RAM and the first core's initial stack
/// pointer. The runtime argument area (see [`Core::set_prog_args`]) lives in this gap.
pub const STACK_TOP_MARGIN: u32 = 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// Zero-based index of this core. Spaces the initial stack pointers of multiple cores
    /// sharing one RAM apart; a single-core setup uses `0`.
    pub core_id: u32,
    /// One past the highest RAM address the runtime conventions may touch. The initial stack
    /// pointer and the program argument area are laid out below this address.
    pub ram_top: u32,
    /// Size of the stack region reserved per core, in bytes.
    pub stack_size: u32,
    /// Address to which the core's PC register is reset.
    pub reset_vector: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core_id: 0,
            ram_top: 0x0400_0000,
            stack_size: DEFAULT_STACK_SIZE,
            reset_vector: 0,
        }
    }
}

/// Functional model of a 32-bit PowerPC integer core.
///
/// The core owns its architectural state and the bus it is connected to. It executes one
/// decoded [`Instruction`] at a time; fetching and decoding are the host's concern. The PC is
/// advanced by one instruction before an instruction's semantics run, so branch semantics see
/// a PC that already points past their own instruction.
#[derive(Debug)]
pub struct Core<B: Bus> {
    config: Config,
    registers: Registers,
    cr: ConditionRegister,
    xer: Xer,
    sprs: SpecialRegisters,
    bus: B,
}

impl<B: Bus> Core<B> {
    /// Creates a core in its reset state, connected to `bus`.
    pub fn new(config: Config, bus: B) -> Self {
        let mut core = Self {
            config,
            registers: Registers::default(),
            cr: ConditionRegister::new(),
            xer: Xer::new(),
            sprs: SpecialRegisters::new(),
            bus,
        };
        core.reset();
        core
    }

    /// Forces this core to its reset state.
    ///
    /// All registers are cleared, then the runtime conventions are applied: the PC is set to
    /// the reset vector, r1 to this core's initial stack pointer (stacks grow down from just
    /// under the top of RAM, one [`Config::stack_size`] region per core), and the link
    /// register to `0xFFFF_FFFF` so a return from the outermost frame is recognizable.
    pub fn reset(&mut self) {
        self.registers = Registers::new(self.config.reset_vector);
        self.cr = ConditionRegister::new();
        self.xer = Xer::new();
        self.sprs = SpecialRegisters::new();

        let stack_pointer = self
            .config
            .ram_top
            .wrapping_sub(STACK_TOP_MARGIN)
            .wrapping_sub(self.config.core_id.wrapping_mul(self.config.stack_size));
        self.registers.set_gpr(Specifier::R1, stack_pointer);
        self.sprs.lr = 0xFFFF_FFFF;

        debug!(
            "core {} reset: pc={:#010x} sp={:#010x}",
            self.config.core_id, self.config.reset_vector, stack_pointer
        );
    }

    /// Provide a read-only view of this core's configuration.
    ///
    /// It is not possible to modify the configuration after creation.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn cr(&self) -> &ConditionRegister {
        &self.cr
    }

    pub fn cr_mut(&mut self) -> &mut ConditionRegister {
        &mut self.cr
    }

    pub fn xer(&self) -> &Xer {
        &self.xer
    }

    pub fn xer_mut(&mut self) -> &mut Xer {
        &mut self.xer
    }

    pub fn sprs(&self) -> &SpecialRegisters {
        &self.sprs
    }

    pub fn sprs_mut(&mut self) -> &mut SpecialRegisters {
        &mut self.sprs
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Returns this core's view of its bus as byte-order-aware memory.
    pub fn memory(&mut self) -> Memory<'_, B> {
        Memory::new(&mut self.bus)
    }

    /// Executes a single decoded instruction.
    ///
    /// The PC is incremented by [`INSTRUCTION_SIZE`] first; the instruction's semantics then
    /// run against the incremented value. Branches account for this by subtracting the
    /// instruction size when they need their own address.
    pub fn execute_instruction(&mut self, instruction: Instruction) {
        *self.registers.pc_mut() = self.registers.pc().wrapping_add(INSTRUCTION_SIZE);

        let mut executor = Executor { core: self };
        match instruction {
            Instruction::OpImm {
                op,
                dest,
                src,
                immediate,
            } => {
                let op = match op {
                    RegImmOp::Addi => Executor::addi,
                    RegImmOp::Addis => Executor::addis,
                    RegImmOp::Mulli => Executor::mulli,
                    RegImmOp::Subfic => Executor::subfic,
                };
                op(&mut executor, dest, src, immediate)
            }
            Instruction::Addic {
                dest,
                src,
                immediate,
                record,
            } => executor.addic(dest, src, immediate, record),
            Instruction::Op {
                op,
                dest,
                src1,
                src2,
                oe,
                record,
            } => {
                let op = match op {
                    RegRegOp::Add => Executor::add,
                    RegRegOp::Addc => Executor::addc,
                    RegRegOp::Adde => Executor::adde,
                    RegRegOp::Subf => Executor::subf,
                    RegRegOp::Subfc => Executor::subfc,
                    RegRegOp::Subfe => Executor::subfe,
                    RegRegOp::Mullw => Executor::mullw,
                    RegRegOp::Divw => Executor::divw,
                    RegRegOp::Divwu => Executor::divwu,
                };
                op(&mut executor, dest, src1, src2, oe, record)
            }
            Instruction::OpUnary {
                op,
                dest,
                src,
                oe,
                record,
            } => {
                let op = match op {
                    RegUnaryOp::Neg => Executor::neg,
                    RegUnaryOp::Addme => Executor::addme,
                    RegUnaryOp::Addze => Executor::addze,
                    RegUnaryOp::Subfme => Executor::subfme,
                    RegUnaryOp::Subfze => Executor::subfze,
                };
                op(&mut executor, dest, src, oe, record)
            }
            Instruction::Mul {
                op,
                dest,
                src1,
                src2,
                record,
            } => {
                let op = match op {
                    MulOp::Mulhw => Executor::mulhw,
                    MulOp::Mulhwu => Executor::mulhwu,
                    MulOp::Mullhw => Executor::mullhw,
                    MulOp::Mullhwu => Executor::mullhwu,
                };
                op(&mut executor, dest, src1, src2, record)
            }
            Instruction::Logical {
                op,
                dest,
                src1,
                src2,
                record,
            } => {
                let op = match op {
                    LogicalOp::And => Executor::and,
                    LogicalOp::Andc => Executor::andc,
                    LogicalOp::Or => Executor::or,
                    LogicalOp::Orc => Executor::orc,
                    LogicalOp::Xor => Executor::xor,
                    LogicalOp::Nand => Executor::nand,
                    LogicalOp::Nor => Executor::nor,
                    LogicalOp::Eqv => Executor::eqv,
                    LogicalOp::Slw => Executor::slw,
                    LogicalOp::Srw => Executor::srw,
                    LogicalOp::Sraw => Executor::sraw,
                };
                op(&mut executor, dest, src1, src2, record)
            }
            Instruction::LogicalImm {
                op,
                dest,
                src,
                immediate,
            } => {
                let op = match op {
                    LogicalImmOp::Andi => Executor::andi,
                    LogicalImmOp::Andis => Executor::andis,
                    LogicalImmOp::Ori => Executor::ori,
                    LogicalImmOp::Oris => Executor::oris,
                    LogicalImmOp::Xori => Executor::xori,
                    LogicalImmOp::Xoris => Executor::xoris,
                };
                op(&mut executor, dest, src, immediate)
            }
            Instruction::Extend {
                op,
                dest,
                src,
                record,
            } => {
                let op = match op {
                    ExtendOp::Extsb => Executor::extsb,
                    ExtendOp::Extsh => Executor::extsh,
                    ExtendOp::Cntlzw => Executor::cntlzw,
                };
                op(&mut executor, dest, src, record)
            }
            Instruction::Srawi {
                dest,
                src,
                shift,
                record,
            } => executor.srawi(dest, src, shift, record),
            Instruction::RotateInsertImm {
                dest,
                src,
                shift,
                mask_begin,
                mask_end,
                record,
            } => executor.rlwimi(dest, src, shift, mask_begin, mask_end, record),
            Instruction::RotateImm {
                dest,
                src,
                shift,
                mask_begin,
                mask_end,
                record,
            } => executor.rlwinm(dest, src, shift, mask_begin, mask_end, record),
            Instruction::RotateReg {
                dest,
                src,
                shift_src,
                mask_begin,
                mask_end,
                record,
            } => executor.rlwnm(dest, src, shift_src, mask_begin, mask_end, record),
            Instruction::Compare { crf, src1, src2 } => executor.cmp(crf, src1, src2),
            Instruction::CompareImm {
                crf,
                src,
                immediate,
            } => executor.cmpi(crf, src, immediate),
            Instruction::CompareLogical { crf, src1, src2 } => executor.cmpl(crf, src1, src2),
            Instruction::CompareLogicalImm {
                crf,
                src,
                immediate,
            } => executor.cmpli(crf, src, immediate),
            Instruction::Branch {
                offset,
                absolute,
                link,
            } => executor.b(offset, absolute, link),
            Instruction::BranchCond {
                bo,
                bi,
                offset,
                absolute,
                link,
            } => executor.bc(bo, bi, offset, absolute, link),
            Instruction::BranchCondCtr { bo, bi, link } => executor.bcctr(bo, bi, link),
            Instruction::BranchCondLr { bo, bi, link } => executor.bclr(bo, bi, link),
            Instruction::CrOp {
                op,
                dest,
                src1,
                src2,
            } => {
                let op = match op {
                    CrOp::Crand => Executor::crand,
                    CrOp::Crandc => Executor::crandc,
                    CrOp::Creqv => Executor::creqv,
                    CrOp::Crnand => Executor::crnand,
                    CrOp::Crnor => Executor::crnor,
                    CrOp::Cror => Executor::cror,
                    CrOp::Crorc => Executor::crorc,
                    CrOp::Crxor => Executor::crxor,
                };
                op(&mut executor, dest, src1, src2)
            }
            Instruction::MoveCrField { dest, src } => executor.mcrf(dest, src),
            Instruction::MoveXerToCr { crf } => executor.mcrxr(crf),
            Instruction::MoveFromCr { dest } => executor.mfcr(dest),
            Instruction::MoveToCrFields { mask, src } => executor.mtcrf(mask, src),
            Instruction::MoveFromSpr { dest, spr } => executor.mfspr(dest, spr),
            Instruction::MoveToSpr { spr, src } => executor.mtspr(spr, src),
            Instruction::Load {
                width,
                dest,
                base,
                offset,
                update,
            } => {
                let op = match width {
                    LoadWidth::ByteZero => Executor::lbz,
                    LoadWidth::HalfwordZero => Executor::lhz,
                    LoadWidth::HalfwordAlgebraic => Executor::lha,
                    LoadWidth::Word => Executor::lwz,
                };
                op(&mut executor, dest, base, offset, update)
            }
            Instruction::LoadIndexed {
                width,
                dest,
                base,
                index,
                update,
            } => {
                let op = match width {
                    LoadWidth::ByteZero => Executor::lbzx,
                    LoadWidth::HalfwordZero => Executor::lhzx,
                    LoadWidth::HalfwordAlgebraic => Executor::lhax,
                    LoadWidth::Word => Executor::lwzx,
                };
                op(&mut executor, dest, base, index, update)
            }
            Instruction::LoadReversed {
                width,
                dest,
                base,
                index,
            } => {
                let op = match width {
                    ReversedWidth::Halfword => Executor::lhbrx,
                    ReversedWidth::Word => Executor::lwbrx,
                };
                op(&mut executor, dest, base, index)
            }
            Instruction::Store {
                width,
                src,
                base,
                offset,
                update,
            } => {
                let op = match width {
                    StoreWidth::Byte => Executor::stb,
                    StoreWidth::Halfword => Executor::sth,
                    StoreWidth::Word => Executor::stw,
                };
                op(&mut executor, src, base, offset, update)
            }
            Instruction::StoreIndexed {
                width,
                src,
                base,
                index,
                update,
            } => {
                let op = match width {
                    StoreWidth::Byte => Executor::stbx,
                    StoreWidth::Halfword => Executor::sthx,
                    StoreWidth::Word => Executor::stwx,
                };
                op(&mut executor, src, base, index, update)
            }
            Instruction::StoreReversed {
                width,
                src,
                base,
                index,
            } => {
                let op = match width {
                    ReversedWidth::Halfword => Executor::sthbrx,
                    ReversedWidth::Word => Executor::stwbrx,
                };
                op(&mut executor, src, base, index)
            }
            Instruction::LoadMultiple { dest, base, offset } => executor.lmw(dest, base, offset),
            Instruction::StoreMultiple { src, base, offset } => executor.stmw(src, base, offset),
            Instruction::LoadStringImm { dest, base, count } => executor.lswi(dest, base, count),
            Instruction::LoadStringIndexed { dest, base, index } => {
                executor.lswx(dest, base, index)
            }
            Instruction::StoreStringImm { src, base, count } => executor.stswi(src, base, count),
            Instruction::StoreStringIndexed { src, base, index } => {
                executor.stswx(src, base, index)
            }
            Instruction::Syscall => executor.sc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::Ram;

    fn test_core() -> Core<Ram> {
        Core::new(
            Config {
                ram_top: 0x0010_0000,
                ..Config::default()
            },
            Ram::new(0x0010_0000),
        )
    }

    #[test]
    fn test_reset_state() {
        let core = test_core();
        assert_eq!(0, core.registers().pc());
        assert_eq!(
            0x0010_0000 - 1024,
            core.registers().gpr(Specifier::R1),
        );
        assert_eq!(0xFFFF_FFFF, core.sprs().lr);
        assert_eq!(0, core.cr().read());
        assert_eq!(0, core.xer().read());
    }

    #[test]
    fn test_reset_spaces_stacks_per_core() {
        let core = Core::new(
            Config {
                core_id: 2,
                ram_top: 0x0100_0000,
                ..Config::default()
            },
            Ram::new(0x0001_0000),
        );
        assert_eq!(
            0x0100_0000 - 1024 - 2 * DEFAULT_STACK_SIZE,
            core.registers().gpr(Specifier::R1),
        );
    }

    #[test]
    fn test_pc_advances_by_one_instruction() {
        let mut core = test_core();
        *core.registers_mut().pc_mut() = 0x1000;
        core.execute_instruction(Instruction::OpImm {
            op: RegImmOp::Addi,
            dest: Specifier::R3,
            src: Specifier::R0,
            immediate: 5,
        });
        assert_eq!(0x1004, core.registers().pc());
        assert_eq!(5, core.registers().gpr(Specifier::R3));
    }

    #[test]
    fn test_reset_clears_sticky_state() {
        let mut core = test_core();
        core.xer_mut().set_so(true);
        core.cr_mut().write(0xFFFF_FFFF);
        core.reset();
        assert_eq!(0, core.xer().read());
        assert_eq!(0, core.cr().read());
    }
}

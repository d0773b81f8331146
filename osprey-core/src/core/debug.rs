//! Debugger access to the core's state.
//!
//! The register numbering follows the common remote-debugging convention for this
//! architecture: a flat space of 104 registers, of which this model implements the general
//! purpose registers and the control registers it models. Slots for registers the model does
//! not carry (the floating point registers among them) read as zero and ignore writes, so a
//! debugger can walk the whole space without special cases.

use super::Core;
use crate::bus::Bus;
use crate::registers::Specifier;

const NUM_REGS: u16 = 104;

const PC_REG: u16 = 96;
const CR_REG: u16 = 98;
const LR_REG: u16 = 99;
const CTR_REG: u16 = 100;
const XER_REG: u16 = 101;

impl<B: Bus> Core<B> {
    /// Returns the size of the debugger's register space.
    pub fn debug_num_regs(&self) -> u16 {
        NUM_REGS
    }

    /// Reads the register in debugger slot `reg`. Unmapped slots read as zero.
    pub fn debug_reg_read(&self, reg: u16) -> u32 {
        match reg {
            0..=31 => self.registers.gpr(Specifier::from_u5(reg as u8)),
            PC_REG => self.registers.pc(),
            CR_REG => self.cr.read(),
            LR_REG => self.sprs.lr,
            CTR_REG => self.sprs.ctr,
            XER_REG => self.xer.read(),
            _ => 0,
        }
    }

    /// Writes the register in debugger slot `reg`. Writes to unmapped slots are ignored.
    pub fn debug_reg_write(&mut self, reg: u16, value: u32) {
        match reg {
            0..=31 => self.registers.set_gpr(Specifier::from_u5(reg as u8), value),
            PC_REG => *self.registers.pc_mut() = value,
            CR_REG => self.cr.write(value),
            LR_REG => self.sprs.lr = value,
            CTR_REG => self.sprs.ctr = value,
            XER_REG => self.xer.write(value),
            _ => {}
        }
    }

    /// Reads `buf.len()` bytes of memory at `address`, as the core would see them.
    pub fn debug_mem_read(&mut self, address: u32, buf: &mut [u8]) {
        self.memory().read(buf, address);
    }

    /// Writes `buf` to memory at `address`, as the core would.
    pub fn debug_mem_write(&mut self, address: u32, buf: &[u8]) {
        self.memory().write(address, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::super::Config;
    use super::*;
    use crate::ram::Ram;

    fn test_core() -> Core<Ram> {
        Core::new(
            Config {
                ram_top: 0x0001_0000,
                ..Config::default()
            },
            Ram::new(0x0001_0000),
        )
    }

    #[test]
    fn test_gpr_slots() {
        let mut core = test_core();
        core.debug_reg_write(3, 0x1234);
        assert_eq!(0x1234, core.registers().gpr(Specifier::R3));
        core.registers_mut().set_gpr(Specifier::R31, 0x5678);
        assert_eq!(0x5678, core.debug_reg_read(31));
    }

    #[test]
    fn test_control_register_slots() {
        let mut core = test_core();
        core.debug_reg_write(96, 0x1000);
        assert_eq!(0x1000, core.registers().pc());
        core.debug_reg_write(98, 0x8000_0000);
        assert_eq!(0x8000_0000, core.cr().read());
        core.debug_reg_write(99, 0x2000);
        assert_eq!(0x2000, core.sprs().lr);
        core.debug_reg_write(100, 7);
        assert_eq!(7, core.sprs().ctr);
        core.debug_reg_write(101, 0xE000_0000);
        assert_eq!(0xE000_0000, core.xer().read());
    }

    #[test]
    fn test_unmapped_slots() {
        let mut core = test_core();
        // Floating point register slots are not modeled.
        core.debug_reg_write(32, 0xFFFF_FFFF);
        assert_eq!(0, core.debug_reg_read(32));
        assert_eq!(0, core.debug_reg_read(103));
        assert_eq!(104, core.debug_num_regs());
    }

    #[test]
    fn test_memory_passthrough() {
        let mut core = test_core();
        core.debug_mem_write(0x100, &[1, 2, 3]);
        let mut buf = [0; 3];
        core.debug_mem_read(0x100, &mut buf);
        assert_eq!([1, 2, 3], buf);
    }
}

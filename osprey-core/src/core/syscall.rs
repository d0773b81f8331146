//! System-call adapter plumbing.
//!
//! Hosts that intercept `sc` instead of letting the in-core vector path run need to move
//! data between host memory and the core's registers and memory. By the calling convention,
//! system call arguments sit in r3 and up; `argn` below selects one of them, so `argn = 0`
//! is r3.

use super::memory::BIG_ENDIAN;
use super::Core;
use crate::bus::Bus;
use crate::registers::Specifier;

/// Size in bytes of the argument string area at the top of RAM.
const ARG_STRINGS_SIZE: u32 = 512;

/// Maximum number of entries in the argument pointer table.
const ARG_TABLE_ENTRIES: u32 = 30;

impl<B: Bus> Core<B> {
    fn arg_register(argn: usize) -> Specifier {
        Specifier::from_u5(3 + argn as u8)
    }

    /// Returns the value of syscall argument `argn`.
    pub fn get_arg(&self, argn: usize) -> u32 {
        self.registers.gpr(Self::arg_register(argn))
    }

    /// Sets syscall argument (or return value) `argn`.
    pub fn set_arg(&mut self, argn: usize, value: u32) {
        self.registers.set_gpr(Self::arg_register(argn), value);
    }

    /// Copies `buf.len()` bytes out of the core's memory, starting at the address held in
    /// syscall argument `argn`.
    pub fn get_buffer(&mut self, argn: usize, buf: &mut [u8]) {
        let address = self.get_arg(argn);
        self.memory().read(buf, address);
    }

    /// Copies `buf` into the core's memory, starting at the address held in syscall
    /// argument `argn`.
    pub fn set_buffer(&mut self, argn: usize, buf: &[u8]) {
        let address = self.get_arg(argn);
        self.memory().write(address, buf);
    }

    /// Writes `words` into the core's memory in the core's byte order, starting at the
    /// address held in syscall argument `argn`.
    ///
    /// This is the word-granular variant `set_prog_args` uses for the pointer table, where
    /// each entry must land as a value the running program can dereference.
    pub fn set_buffer_words(&mut self, argn: usize, words: &[u32]) {
        let mut address = self.get_arg(argn);
        let mut memory = self.memory();
        for &word in words {
            memory.write_word::<BIG_ENDIAN>(address, word);
            address = address.wrapping_add(4);
        }
    }

    /// Returns from an intercepted system call by jumping to the link register.
    pub fn return_from_syscall(&mut self) {
        *self.registers.pc_mut() = self.sprs.lr;
    }

    /// Lays out the program's command-line arguments in memory and points r3/r4 at them.
    ///
    /// The NUL-terminated argument strings are packed at `ram_top - 512`; a table of
    /// pointers to them goes right below, at `ram_top - 632`. On return r3 holds the
    /// argument count and r4 the table address, matching what a C runtime's startup code
    /// expects to find.
    ///
    /// # Panics
    ///
    /// Panics if there are more than 30 arguments or the packed strings exceed 512 bytes.
    pub fn set_prog_args<S: AsRef<str>>(&mut self, args: &[S]) {
        assert!(
            args.len() <= ARG_TABLE_ENTRIES as usize,
            "too many program arguments"
        );
        let strings_base = self.config.ram_top.wrapping_sub(ARG_STRINGS_SIZE);
        let table_base = strings_base.wrapping_sub(4 * ARG_TABLE_ENTRIES);

        let mut strings = Vec::with_capacity(ARG_STRINGS_SIZE as usize);
        let mut pointers = Vec::with_capacity(args.len());
        for arg in args {
            pointers.push(strings_base.wrapping_add(strings.len() as u32));
            strings.extend_from_slice(arg.as_ref().as_bytes());
            strings.push(0);
        }
        assert!(
            strings.len() <= ARG_STRINGS_SIZE as usize,
            "program arguments exceed the argument string area"
        );

        self.set_arg(0, strings_base);
        self.set_buffer(0, &strings);
        self.set_arg(0, table_base);
        self.set_buffer_words(0, &pointers);

        self.set_arg(0, args.len() as u32);
        self.set_arg(1, table_base);
    }
}

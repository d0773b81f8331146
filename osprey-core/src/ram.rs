//! A flat RAM implementation of [`Bus`].

use crate::bus::Bus;

/// Byte-addressable RAM backing the whole 32-bit address space by wrapping.
///
/// Addresses are reduced modulo the RAM's size, so every access lands somewhere and the bus
/// contract's no-panic rule holds for any `(address, size)` pair. Hosts with memory-mapped
/// devices will implement [`Bus`] themselves; this type covers plain program-in-memory setups
/// and the test suite.
#[derive(Debug, Clone)]
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    /// Creates a zero-filled RAM of `size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "RAM cannot be empty");
        Self {
            data: vec![0; size],
        }
    }

    /// Creates a RAM of `size` bytes with `image` copied to address zero.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero or smaller than the image.
    pub fn with_image(size: usize, image: &[u8]) -> Self {
        let mut ram = Self::new(size);
        ram.data[..image.len()].copy_from_slice(image);
        ram
    }

    /// Returns the RAM's size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn index(&self, address: u32) -> usize {
        address as usize % self.data.len()
    }
}

impl Bus for Ram {
    fn read(&self, buf: &mut [u8], address: u32) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.data[self.index(address.wrapping_add(i as u32))];
        }
    }

    fn write(&mut self, address: u32, buf: &[u8]) {
        for (i, &byte) in buf.iter().enumerate() {
            let index = self.index(address.wrapping_add(i as u32));
            self.data[index] = byte;
        }
    }
}

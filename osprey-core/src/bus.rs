//! Defines the byte-level bus interface through which the core reaches memory.

use std::fmt::Debug;

/// The core's window onto the host-owned address space.
///
/// Accesses can be made for any `(address, size)` pair: addresses are 32 bits wide and `size`
/// (the length of the passed buffer) is unrestricted. Addresses always correspond to bytes;
/// byte-order interpretation of multi-byte values is layered on top by the core and is not the
/// bus's concern.
///
/// Implementors decide how to treat the address space. They may make it circular (so addresses
/// wrap around), mirror regions, or return undefined values for addresses outside their range.
/// Whatever the choice, every access must be handled without panicking, and accesses must stay
/// deterministic: the same access on the same state alters `buf` the same way. Reads cannot
/// rely on the incoming contents of `buf`.
///
/// Accesses are infallible. The model performs no alignment or permission checks of its own;
/// an implementor wanting such policies applies them internally.
pub trait Bus: Debug {
    /// Invoke a read access for `address` with size `buf.len()`, writing the result to `buf`.
    fn read(&self, buf: &mut [u8], address: u32);

    /// Invoke a write access for `address` with size `buf.len()`, reading the data from `buf`.
    fn write(&mut self, address: u32, buf: &[u8]);
}

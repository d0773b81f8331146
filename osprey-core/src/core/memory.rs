use crate::bus::Bus;

macro_rules! access_fns {
    ( $( $read_fn:ident, $write_fn:ident => $u:ident ),* $(,)? ) => {
        $(
            /// Invoke a read for the specified address.
            ///
            /// The address doesn't need to be naturally aligned; no alignment checks are
            /// performed.
            pub fn $read_fn<const E: MemOpEndianness>(&self, address: u32) -> $u {
                let mut buf = [0u8; std::mem::size_of::<$u>()];
                self.bus.read(&mut buf, address);
                match E {
                    LITTLE_ENDIAN => $u::from_le_bytes(buf),
                    BIG_ENDIAN => $u::from_be_bytes(buf),
                    _ => unreachable!(),
                }
            }

            /// Invoke a write for the specified address.
            ///
            /// The address doesn't need to be naturally aligned; no alignment checks are
            /// performed.
            pub fn $write_fn<const E: MemOpEndianness>(&mut self, address: u32, value: $u) {
                let buf = match E {
                    LITTLE_ENDIAN => value.to_le_bytes(),
                    BIG_ENDIAN => value.to_be_bytes(),
                    _ => unreachable!(),
                };
                self.bus.write(address, &buf);
            }
        )*
    };
}

pub type MemOpEndianness = u8;

/// Big-endian (most significant byte at lowest address). The core's native byte order.
pub const BIG_ENDIAN: MemOpEndianness = 0;

/// Little-endian (least significant byte at lowest address). Used by the byte-reversed
/// load/store forms.
pub const LITTLE_ENDIAN: MemOpEndianness = 1;

/// Access wrapper around a raw bus to address it as memory from the core's point of view.
///
/// This is a continuous, byte-addressable address space of `pow(2, 32)` bytes; how addresses
/// map to actual storage is the bus's business. The wrapper adds byte-order handling for
/// multi-byte values on top of the bus's byte-level interface.
#[derive(Debug)]
pub struct Memory<'b, B: Bus> {
    bus: &'b mut B,
}

impl<'b, B: Bus> Memory<'b, B> {
    pub fn new(bus: &'b mut B) -> Self {
        Self { bus }
    }

    pub fn read(&self, buf: &mut [u8], address: u32) {
        self.bus.read(buf, address);
    }

    pub fn write(&mut self, address: u32, buf: &[u8]) {
        self.bus.write(address, buf);
    }

    pub fn read_byte(&self, address: u32) -> u8 {
        let mut buf = [0];
        self.bus.read(&mut buf, address);
        buf[0]
    }

    pub fn write_byte(&mut self, address: u32, value: u8) {
        self.bus.write(address, &[value]);
    }

    access_fns! {
        read_halfword, write_halfword => u16,
        read_word, write_word => u32,
    }
}

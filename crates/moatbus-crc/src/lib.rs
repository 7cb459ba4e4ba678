//! Table-driven CRC8 and CRC16 for the MoatBus wire format.
//!
//! Both checksums are MSB-first, start from zero and apply no final XOR.
//! Besides the usual byte-at-a-time update each one can be advanced by an
//! arbitrary number of bits (1..=16). Bus frames are sent in chunks of 1 to
//! 16 bits, so sender and receiver fold the checksum chunk by chunk and
//! arrive at the same value the byte-wise update would produce.
//!
//! The lookup tables are fixed wire constants shared with deployed peers.

pub mod checksum;
pub mod crc16;
pub mod crc8;

pub use checksum::Checksum;
pub use crc16::Crc16;
pub use crc8::Crc8;

/// Widest chunk accepted by the bit-granular update functions.
pub const MAX_UPDATE_BITS: u8 = 16;

/// Mask `value` down to its low `n_bits` bits.
#[inline]
pub(crate) fn low_bits(value: u16, n_bits: u8) -> u32 {
    u32::from(value) & ((1u32 << n_bits) - 1)
}

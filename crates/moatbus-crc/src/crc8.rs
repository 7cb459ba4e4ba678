//! CRC8, polynomial 0x97 (MSB first), zero init, no final XOR.

use crate::checksum::Checksum;
use crate::{low_bits, MAX_UPDATE_BITS};

/// Generator polynomial without the x^8 term.
pub const POLY: u8 = 0x97;

static TABLE: [u8; 256] = [
    0x00, 0x97, 0xB9, 0x2E, 0xE5, 0x72, 0x5C, 0xCB,
    0x5D, 0xCA, 0xE4, 0x73, 0xB8, 0x2F, 0x01, 0x96,
    0xBA, 0x2D, 0x03, 0x94, 0x5F, 0xC8, 0xE6, 0x71,
    0xE7, 0x70, 0x5E, 0xC9, 0x02, 0x95, 0xBB, 0x2C,
    0xE3, 0x74, 0x5A, 0xCD, 0x06, 0x91, 0xBF, 0x28,
    0xBE, 0x29, 0x07, 0x90, 0x5B, 0xCC, 0xE2, 0x75,
    0x59, 0xCE, 0xE0, 0x77, 0xBC, 0x2B, 0x05, 0x92,
    0x04, 0x93, 0xBD, 0x2A, 0xE1, 0x76, 0x58, 0xCF,
    0x51, 0xC6, 0xE8, 0x7F, 0xB4, 0x23, 0x0D, 0x9A,
    0x0C, 0x9B, 0xB5, 0x22, 0xE9, 0x7E, 0x50, 0xC7,
    0xEB, 0x7C, 0x52, 0xC5, 0x0E, 0x99, 0xB7, 0x20,
    0xB6, 0x21, 0x0F, 0x98, 0x53, 0xC4, 0xEA, 0x7D,
    0xB2, 0x25, 0x0B, 0x9C, 0x57, 0xC0, 0xEE, 0x79,
    0xEF, 0x78, 0x56, 0xC1, 0x0A, 0x9D, 0xB3, 0x24,
    0x08, 0x9F, 0xB1, 0x26, 0xED, 0x7A, 0x54, 0xC3,
    0x55, 0xC2, 0xEC, 0x7B, 0xB0, 0x27, 0x09, 0x9E,
    0xA2, 0x35, 0x1B, 0x8C, 0x47, 0xD0, 0xFE, 0x69,
    0xFF, 0x68, 0x46, 0xD1, 0x1A, 0x8D, 0xA3, 0x34,
    0x18, 0x8F, 0xA1, 0x36, 0xFD, 0x6A, 0x44, 0xD3,
    0x45, 0xD2, 0xFC, 0x6B, 0xA0, 0x37, 0x19, 0x8E,
    0x41, 0xD6, 0xF8, 0x6F, 0xA4, 0x33, 0x1D, 0x8A,
    0x1C, 0x8B, 0xA5, 0x32, 0xF9, 0x6E, 0x40, 0xD7,
    0xFB, 0x6C, 0x42, 0xD5, 0x1E, 0x89, 0xA7, 0x30,
    0xA6, 0x31, 0x1F, 0x88, 0x43, 0xD4, 0xFA, 0x6D,
    0xF3, 0x64, 0x4A, 0xDD, 0x16, 0x81, 0xAF, 0x38,
    0xAE, 0x39, 0x17, 0x80, 0x4B, 0xDC, 0xF2, 0x65,
    0x49, 0xDE, 0xF0, 0x67, 0xAC, 0x3B, 0x15, 0x82,
    0x14, 0x83, 0xAD, 0x3A, 0xF1, 0x66, 0x48, 0xDF,
    0x10, 0x87, 0xA9, 0x3E, 0xF5, 0x62, 0x4C, 0xDB,
    0x4D, 0xDA, 0xF4, 0x63, 0xA8, 0x3F, 0x11, 0x86,
    0xAA, 0x3D, 0x13, 0x84, 0x4F, 0xD8, 0xF6, 0x61,
    0xF7, 0x60, 0x4E, 0xD9, 0x12, 0x85, 0xAB, 0x3C,];

/// Initial checksum value.
#[inline]
pub const fn init() -> u8 {
    0
}

/// Mix one byte into `crc`.
#[inline]
pub fn update(crc: u8, byte: u8) -> u8 {
    TABLE[usize::from(byte ^ crc)]
}

/// Mix the low `n_bits` bits of `value` into `crc`, most significant bit first.
///
/// `n_bits` ranges over 1..=16. Folding a bit stream through this function in
/// any partition yields the same result as [`update`] over the whole bytes.
pub fn update_bits(crc: u8, value: u16, n_bits: u8) -> u8 {
    debug_assert!(n_bits <= MAX_UPDATE_BITS, "n_bits out of range: {n_bits}");
    let mut n = n_bits.min(MAX_UPDATE_BITS);
    if n == 0 {
        return crc;
    }
    let value = low_bits(value, n);

    let mut crc = u32::from(crc);
    if n > 8 {
        n -= 8;
        crc = u32::from(TABLE[((crc ^ (value >> n)) & 0xFF) as usize]);
    }
    let shift = 8 - u32::from(n);
    crc = (crc ^ (value << shift)) & 0xFF;
    let next = u32::from(TABLE[(crc >> shift) as usize]) ^ (crc << n);
    (next & 0xFF) as u8
}

/// Finalize a checksum. CRC8 applies no final transformation.
#[inline]
pub const fn finish(crc: u8) -> u8 {
    crc
}

/// Checksum of a byte slice.
pub fn checksum(data: &[u8]) -> u8 {
    finish(data.iter().fold(init(), |crc, &byte| update(crc, byte)))
}

/// Stateful CRC8 accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc8 {
    crc: u8,
}

impl Crc8 {
    /// Create an accumulator in its initial state.
    pub const fn new() -> Self {
        Self { crc: init() }
    }

    /// Current checksum value.
    pub fn value(&self) -> u8 {
        finish(self.crc)
    }
}

impl Checksum for Crc8 {
    const WIDTH: u8 = 8;

    fn reset(&mut self) {
        self.crc = init();
    }

    fn update(&mut self, byte: u8) {
        self.crc = update(self.crc, byte);
    }

    fn update_bits(&mut self, value: u16, n_bits: u8) {
        self.crc = update_bits(self.crc, value, n_bits);
    }

    fn finish(&self) -> u16 {
        u16::from(finish(self.crc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_entry(index: u8) -> u8 {
        let mut crc = index;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
        crc
    }

    /// Read `n` bits MSB-first from `data` starting at bit `pos`.
    fn take_bits(data: &[u8], pos: usize, n: usize) -> u16 {
        (pos..pos + n).fold(0u16, |acc, bit| {
            let set = data[bit / 8] >> (7 - bit % 8) & 1;
            (acc << 1) | u16::from(set)
        })
    }

    #[test]
    fn table_is_generated_by_polynomial() {
        for index in 0..=255u8 {
            assert_eq!(TABLE[usize::from(index)], table_entry(index), "entry {index}");
        }
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn single_byte_is_table_lookup() {
        assert_eq!(checksum(&[0x01]), 0x97);
        assert_eq!(checksum(&[0x02]), 0xB9);
        assert_eq!(checksum(&[0x01, 0x00]), TABLE[0x97]);
    }

    #[test]
    fn eight_bit_update_matches_byte_update() {
        for crc in [0u8, 0x01, 0x5A, 0xFF] {
            for byte in 0..=255u8 {
                assert_eq!(update_bits(crc, u16::from(byte), 8), update(crc, byte));
            }
        }
    }

    #[test]
    fn sixteen_bit_update_matches_two_bytes() {
        let crc = update(update(0x33, 0xAB), 0xCD);
        assert_eq!(update_bits(0x33, 0xABCD, 16), crc);
    }

    #[test]
    fn single_bits_match_byte_update() {
        let data = b"MoatBus";
        let mut crc = init();
        for bit in 0..data.len() * 8 {
            crc = update_bits(crc, take_bits(data, bit, 1), 1);
        }
        assert_eq!(crc, checksum(data));
    }

    #[test]
    fn random_partitions_match_byte_update() {
        let mut rng = fastrand::Rng::with_seed(0x8008);
        for _ in 0..200 {
            let len = rng.usize(1..40);
            let data: Vec<u8> = (0..len).map(|_| rng.u8(..)).collect();
            let total = len * 8;

            let mut crc = init();
            let mut pos = 0;
            while pos < total {
                let width = rng.usize(1..=16).min(total - pos);
                crc = update_bits(crc, take_bits(&data, pos, width), width as u8);
                pos += width;
            }
            assert_eq!(crc, checksum(&data));
        }
    }

    #[test]
    fn high_bits_above_width_are_ignored() {
        assert_eq!(update_bits(0x10, 0xFFF5, 3), update_bits(0x10, 0x0005, 3));
    }

    #[test]
    fn zero_width_leaves_crc_unchanged() {
        assert_eq!(update_bits(0x42, 0x1234, 0), 0x42);
    }

    #[test]
    fn accumulator_matches_free_functions() {
        let mut acc = Crc8::new();
        acc.update_slice(b"abc");
        acc.update_bits(0b101, 3);
        let expected = update_bits(checksum(b"abc"), 0b101, 3);
        assert_eq!(acc.value(), expected);
        assert_eq!(acc.finish(), u16::from(expected));

        acc.reset();
        assert_eq!(acc.value(), 0);
    }
}

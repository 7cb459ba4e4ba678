//! CRC16, polynomial 0xBAAD (MSB first), zero init, no final XOR.

use crate::checksum::Checksum;
use crate::{low_bits, MAX_UPDATE_BITS};

/// Generator polynomial without the x^16 term.
pub const POLY: u16 = 0xBAAD;

static TABLE: [u16; 256] = [
    0x0000, 0xBAAD, 0xCFF7, 0x755A, 0x2543, 0x9FEE, 0xEAB4, 0x5019,
    0x4A86, 0xF02B, 0x8571, 0x3FDC, 0x6FC5, 0xD568, 0xA032, 0x1A9F,
    0x950C, 0x2FA1, 0x5AFB, 0xE056, 0xB04F, 0x0AE2, 0x7FB8, 0xC515,
    0xDF8A, 0x6527, 0x107D, 0xAAD0, 0xFAC9, 0x4064, 0x353E, 0x8F93,
    0x90B5, 0x2A18, 0x5F42, 0xE5EF, 0xB5F6, 0x0F5B, 0x7A01, 0xC0AC,
    0xDA33, 0x609E, 0x15C4, 0xAF69, 0xFF70, 0x45DD, 0x3087, 0x8A2A,
    0x05B9, 0xBF14, 0xCA4E, 0x70E3, 0x20FA, 0x9A57, 0xEF0D, 0x55A0,
    0x4F3F, 0xF592, 0x80C8, 0x3A65, 0x6A7C, 0xD0D1, 0xA58B, 0x1F26,
    0x9BC7, 0x216A, 0x5430, 0xEE9D, 0xBE84, 0x0429, 0x7173, 0xCBDE,
    0xD141, 0x6BEC, 0x1EB6, 0xA41B, 0xF402, 0x4EAF, 0x3BF5, 0x8158,
    0x0ECB, 0xB466, 0xC13C, 0x7B91, 0x2B88, 0x9125, 0xE47F, 0x5ED2,
    0x444D, 0xFEE0, 0x8BBA, 0x3117, 0x610E, 0xDBA3, 0xAEF9, 0x1454,
    0x0B72, 0xB1DF, 0xC485, 0x7E28, 0x2E31, 0x949C, 0xE1C6, 0x5B6B,
    0x41F4, 0xFB59, 0x8E03, 0x34AE, 0x64B7, 0xDE1A, 0xAB40, 0x11ED,
    0x9E7E, 0x24D3, 0x5189, 0xEB24, 0xBB3D, 0x0190, 0x74CA, 0xCE67,
    0xD4F8, 0x6E55, 0x1B0F, 0xA1A2, 0xF1BB, 0x4B16, 0x3E4C, 0x84E1,
    0x8D23, 0x378E, 0x42D4, 0xF879, 0xA860, 0x12CD, 0x6797, 0xDD3A,
    0xC7A5, 0x7D08, 0x0852, 0xB2FF, 0xE2E6, 0x584B, 0x2D11, 0x97BC,
    0x182F, 0xA282, 0xD7D8, 0x6D75, 0x3D6C, 0x87C1, 0xF29B, 0x4836,
    0x52A9, 0xE804, 0x9D5E, 0x27F3, 0x77EA, 0xCD47, 0xB81D, 0x02B0,
    0x1D96, 0xA73B, 0xD261, 0x68CC, 0x38D5, 0x8278, 0xF722, 0x4D8F,
    0x5710, 0xEDBD, 0x98E7, 0x224A, 0x7253, 0xC8FE, 0xBDA4, 0x0709,
    0x889A, 0x3237, 0x476D, 0xFDC0, 0xADD9, 0x1774, 0x622E, 0xD883,
    0xC21C, 0x78B1, 0x0DEB, 0xB746, 0xE75F, 0x5DF2, 0x28A8, 0x9205,
    0x16E4, 0xAC49, 0xD913, 0x63BE, 0x33A7, 0x890A, 0xFC50, 0x46FD,
    0x5C62, 0xE6CF, 0x9395, 0x2938, 0x7921, 0xC38C, 0xB6D6, 0x0C7B,
    0x83E8, 0x3945, 0x4C1F, 0xF6B2, 0xA6AB, 0x1C06, 0x695C, 0xD3F1,
    0xC96E, 0x73C3, 0x0699, 0xBC34, 0xEC2D, 0x5680, 0x23DA, 0x9977,
    0x8651, 0x3CFC, 0x49A6, 0xF30B, 0xA312, 0x19BF, 0x6CE5, 0xD648,
    0xCCD7, 0x767A, 0x0320, 0xB98D, 0xE994, 0x5339, 0x2663, 0x9CCE,
    0x135D, 0xA9F0, 0xDCAA, 0x6607, 0x361E, 0x8CB3, 0xF9E9, 0x4344,
    0x59DB, 0xE376, 0x962C, 0x2C81, 0x7C98, 0xC635, 0xB36F, 0x09C2,];

/// Initial checksum value.
#[inline]
pub const fn init() -> u16 {
    0
}

/// Mix one byte into `crc`.
#[inline]
pub fn update(crc: u16, byte: u8) -> u16 {
    TABLE[usize::from(byte ^ (crc >> 8) as u8)] ^ (crc << 8)
}

/// Mix the low `n_bits` bits of `value` into `crc`, most significant bit first.
///
/// See [`crate::crc8::update_bits`]; the same partition guarantee holds.
pub fn update_bits(crc: u16, value: u16, n_bits: u8) -> u16 {
    debug_assert!(n_bits <= MAX_UPDATE_BITS, "n_bits out of range: {n_bits}");
    let mut n = u32::from(n_bits.min(MAX_UPDATE_BITS));
    if n == 0 {
        return crc;
    }

    let mut crc = (u32::from(crc) ^ (low_bits(value, n as u8) << (16 - n))) & 0xFFFF;
    if n > 8 {
        crc = (u32::from(TABLE[(crc >> 8) as usize]) ^ (crc << 8)) & 0xFFFF;
        n -= 8;
    }
    let next = u32::from(TABLE[(crc >> (16 - n)) as usize]) ^ (crc << n);
    (next & 0xFFFF) as u16
}

/// Finalize a checksum. CRC16 applies no final transformation.
#[inline]
pub const fn finish(crc: u16) -> u16 {
    crc
}

/// Checksum of a byte slice.
pub fn checksum(data: &[u8]) -> u16 {
    finish(data.iter().fold(init(), |crc, &byte| update(crc, byte)))
}

/// Stateful CRC16 accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc16 {
    crc: u16,
}

impl Crc16 {
    /// Create an accumulator in its initial state.
    pub const fn new() -> Self {
        Self { crc: init() }
    }

    /// Current checksum value.
    pub fn value(&self) -> u16 {
        finish(self.crc)
    }
}

impl Checksum for Crc16 {
    const WIDTH: u8 = 16;

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
        finish(self.crc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_entry(index: u8) -> u16 {
        let mut crc = u16::from(index) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
        crc
    }

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
    fn known_values() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0x01]), 0xBAAD);
        assert_eq!(checksum(&[0x00, 0x01]), 0xBAAD);
        assert_eq!(checksum(&[0x01, 0x00]), TABLE[0xBA] ^ 0xAD00);
    }

    #[test]
    fn eight_bit_update_matches_byte_update() {
        for crc in [0u16, 0x0001, 0xBEEF, 0xFFFF] {
            for byte in 0..=255u8 {
                assert_eq!(update_bits(crc, u16::from(byte), 8), update(crc, byte));
            }
        }
    }

    #[test]
    fn wide_updates_match_byte_update() {
        let bytes = update(update(0x1234, 0xDE), 0xAD);
        assert_eq!(update_bits(0x1234, 0xDEAD, 16), bytes);

        // 12 + 4 bits cover the same two bytes
        let split = update_bits(update_bits(0x1234, 0xDEA, 12), 0xD, 4);
        assert_eq!(split, bytes);
    }

    #[test]
    fn random_partitions_match_byte_update() {
        let mut rng = fastrand::Rng::with_seed(0xBAAD);
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
    fn accumulator_tracks_updates() {
        let mut acc = Crc16::new();
        acc.update_slice(&[0x01]);
        assert_eq!(acc.value(), 0xBAAD);
        assert_eq!(Checksum::finish(&acc), 0xBAAD);

        acc.reset();
        acc.update_bits(0x0, 7);
        acc.update_bits(0x1, 1);
        assert_eq!(acc.value(), 0xBAAD);
    }
}

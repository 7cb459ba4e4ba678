//! MSB-first bit access into byte slices.
//!
//! Callers check bounds; positions are absolute bit indices.

/// Read `n` bits starting at bit `pos`.
pub(crate) fn read_bits(buf: &[u8], pos: usize, n: usize) -> u32 {
    debug_assert!(n <= 32);
    let mut value = 0u32;
    let mut pos = pos;
    let mut remaining = n;
    while remaining > 0 {
        let avail = 8 - pos % 8;
        let take = avail.min(remaining);
        let bits = (u32::from(buf[pos / 8]) >> (avail - take)) & ((1u32 << take) - 1);
        value = (value << take) | bits;
        pos += take;
        remaining -= take;
    }
    value
}

/// Overwrite `n` bits starting at bit `pos` with the low `n` bits of `value`.
pub(crate) fn write_bits(buf: &mut [u8], pos: usize, value: u32, n: usize) {
    debug_assert!(n <= 32);
    let mut pos = pos;
    let mut remaining = n;
    while remaining > 0 {
        let avail = 8 - pos % 8;
        let take = avail.min(remaining);
        let shift = avail - take;
        let mask = (((1u32 << take) - 1) << shift) as u8;
        let bits = (((value >> (remaining - take)) & ((1u32 << take) - 1)) << shift) as u8;
        let byte = &mut buf[pos / 8];
        *byte = (*byte & !mask) | bits;
        pos += take;
        remaining -= take;
    }
}

/// Zero the bits from `pos` up to the next byte boundary.
pub(crate) fn clear_tail(buf: &mut [u8], pos: usize) {
    let offset = pos % 8;
    if offset != 0 {
        buf[pos / 8] &= !(0xFFu8 >> offset);
    }
}

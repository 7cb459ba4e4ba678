use moatbus_crc::{crc16, crc8, MAX_UPDATE_BITS};

use crate::error;

/// Borrow `len` bytes at `data`; a null pointer is only accepted for an
/// empty input.
///
/// # Safety
/// If non-null, `data` must point to `len` readable bytes.
unsafe fn input<'a>(data: *const u8, len: usize) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        let _ = error::set_invalid_argument("data cannot be null");
        return None;
    }
    // SAFETY: Pointer validity and length are guaranteed by the caller.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

fn bits_in_range(bits: u8) -> bool {
    if bits > MAX_UPDATE_BITS {
        let _ = error::set_invalid_argument(format!("bits must be at most {MAX_UPDATE_BITS}"));
        return false;
    }
    true
}

/// CRC8 of `len` bytes at `data`.
///
/// # Safety
/// `data` must point to `len` readable bytes, or be null when `len` is 0.
#[no_mangle]
pub unsafe extern "C" fn mb_crc8(data: *const u8, len: usize) -> u8 {
    crate::ffi_boundary(0, || {
        error::clear_error_state();
        // SAFETY: Forwarded caller guarantee.
        unsafe { input(data, len) }.map_or(0, crc8::checksum)
    })
}

#[no_mangle]
pub extern "C" fn mb_crc8_update(crc: u8, byte: u8) -> u8 {
    crate::ffi_boundary(crc, || crc8::update(crc, byte))
}

/// Fold the low `bits` bits of `value` into `crc`. Out-of-range widths
/// leave `crc` unchanged and record an error.
#[no_mangle]
pub extern "C" fn mb_crc8_update_bits(crc: u8, value: u16, bits: u8) -> u8 {
    crate::ffi_boundary(crc, || {
        if !bits_in_range(bits) {
            return crc;
        }
        crc8::update_bits(crc, value, bits)
    })
}

/// CRC16 of `len` bytes at `data`.
///
/// # Safety
/// `data` must point to `len` readable bytes, or be null when `len` is 0.
#[no_mangle]
pub unsafe extern "C" fn mb_crc16(data: *const u8, len: usize) -> u16 {
    crate::ffi_boundary(0, || {
        error::clear_error_state();
        // SAFETY: Forwarded caller guarantee.
        unsafe { input(data, len) }.map_or(0, crc16::checksum)
    })
}

#[no_mangle]
pub extern "C" fn mb_crc16_update(crc: u16, byte: u8) -> u16 {
    crate::ffi_boundary(crc, || crc16::update(crc, byte))
}

#[no_mangle]
pub extern "C" fn mb_crc16_update_bits(crc: u16, value: u16, bits: u8) -> u16 {
    crate::ffi_boundary(crc, || {
        if !bits_in_range(bits) {
            return crc;
        }
        crc16::update_bits(crc, value, bits)
    })
}

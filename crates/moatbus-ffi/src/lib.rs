//! moatbus-ffi: C-ABI exports of the MoatBus checksums and message buffers.

mod crc;
mod error;
mod message;
mod types;

use std::panic::AssertUnwindSafe;

pub use crc::{
    mb_crc16, mb_crc16_update, mb_crc16_update_bits, mb_crc8, mb_crc8_update, mb_crc8_update_bits,
};
pub use message::{
    mb_msg_add_chunk, mb_msg_add_data, mb_msg_alloc, mb_msg_align, mb_msg_bit_length,
    mb_msg_data, mb_msg_decode_header, mb_msg_encode_header, mb_msg_extract_chunk,
    mb_msg_extract_more, mb_msg_free, mb_msg_get_header, mb_msg_set_header, mb_msg_start_add,
    mb_msg_start_extract, mb_msg_start_send,
};
pub use types::{
    MbHeader, MbMessage, MbResult, MB_ERR_BUFFER_OWNERSHIP, MB_ERR_CORRUPT_HEADER,
    MB_ERR_CURSOR_OVERFLOW, MB_ERR_DETACHED, MB_ERR_INTERNAL, MB_ERR_INVALID_ARGUMENT,
    MB_ERR_INVALID_HEADER_FIELD, MB_ERR_INVALID_TRANSITION, MB_ERR_INVALID_WIDTH,
    MB_ERR_OUT_OF_MEMORY, MB_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

/// Clear the calling thread's error state.
#[no_mangle]
pub extern "C" fn mb_init() -> MbResult {
    ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        MbResult::Ok
    })
}

/// Message of the last failed call on this thread; empty if none.
/// The pointer is valid until the next call on the same thread.
#[no_mangle]
pub extern "C" fn mb_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

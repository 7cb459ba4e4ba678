use moatbus_message::{Message, MessageConfig, MSG_MINBUF};

use crate::error;
use crate::types::{MbHeader, MbMessage, MbResult};

fn with_msg<T>(handle: *mut MbMessage, on_error: T, f: impl FnOnce(&mut Message<'static>) -> T) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("message handle cannot be null");
        return on_error;
    }

    let handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *handle }
    };

    f(&mut handle.msg)
}

fn status(result: moatbus_message::Result<()>) -> MbResult {
    match result {
        Ok(()) => MbResult::Ok,
        Err(err) => error::map_message_error(&err),
    }
}

/// Allocate an owned message with room for `capacity` payload bytes.
/// A capacity of 0 selects the default size. Returns null on failure.
#[no_mangle]
pub extern "C" fn mb_msg_alloc(capacity: usize) -> *mut MbMessage {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();
        let config = MessageConfig {
            initial_capacity: if capacity == 0 { MSG_MINBUF } else { capacity },
            ..MessageConfig::default()
        };
        match Message::with_config(&config) {
            Ok(msg) => Box::into_raw(Box::new(MbMessage { msg })),
            Err(err) => {
                let _ = error::map_message_error(&err);
                std::ptr::null_mut()
            }
        }
    })
}

/// Free a message handle and its buffer.
///
/// # Safety
/// `msg` must be null or a handle returned by `mb_msg_alloc`, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_free(msg: *mut MbMessage) {
    crate::ffi_boundary((), || {
        if msg.is_null() {
            return;
        }
        // SAFETY: Handle was allocated with Box::into_raw in mb_msg_alloc.
        unsafe {
            drop(Box::from_raw(msg));
        }
    });
}

/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_start_send(msg: *mut MbMessage) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        with_msg(msg, MbResult::InvalidArgument, |m| {
            m.start_send();
            MbResult::Ok
        })
    })
}

/// Append `len` payload bytes.
///
/// # Safety
/// `msg` must be a valid handle. `data` must point to `len` readable bytes,
/// or be null when `len` is 0.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_add_data(
    msg: *mut MbMessage,
    data: *const u8,
    len: usize,
) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        if data.is_null() && len > 0 {
            return error::set_invalid_argument("data cannot be null");
        }
        with_msg(msg, MbResult::InvalidArgument, |m| {
            let bytes: &[u8] = if len == 0 {
                &[]
            } else {
                // SAFETY: Pointer validity and length are guaranteed by the caller.
                unsafe { std::slice::from_raw_parts(data, len) }
            };
            status(m.append_bytes(bytes))
        })
    })
}

/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_start_extract(msg: *mut MbMessage) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        with_msg(msg, MbResult::InvalidArgument, |m| {
            m.start_extract();
            MbResult::Ok
        })
    })
}

/// Whether unread bits remain.
///
/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_extract_more(msg: *mut MbMessage) -> bool {
    crate::ffi_boundary(false, || with_msg(msg, false, |m| m.has_more()))
}

/// Extract the next `frame_bits`-wide chunk into `out`.
///
/// # Safety
/// `msg` must be a valid handle and `out` a valid pointer to a `u32`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_extract_chunk(
    msg: *mut MbMessage,
    frame_bits: u8,
    out: *mut u32,
) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        if out.is_null() {
            return error::set_invalid_argument("out cannot be null");
        }
        with_msg(msg, MbResult::InvalidArgument, |m| {
            match m.extract_chunk(frame_bits) {
                Ok(chunk) => {
                    // SAFETY: Pointer validity is guaranteed by the caller.
                    unsafe { *out = chunk };
                    MbResult::Ok
                }
                Err(err) => error::map_message_error(&err),
            }
        })
    })
}

/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_start_add(msg: *mut MbMessage) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        with_msg(msg, MbResult::InvalidArgument, |m| {
            m.start_add();
            MbResult::Ok
        })
    })
}

/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_add_chunk(msg: *mut MbMessage, value: u32, frame_bits: u8) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        with_msg(msg, MbResult::InvalidArgument, |m| {
            status(m.add_chunk(value, frame_bits))
        })
    })
}

/// Append the final chunk of a frame and align to a byte boundary.
///
/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_add_last_chunk(
    msg: *mut MbMessage,
    value: u32,
    frame_bits: u8,
) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        with_msg(msg, MbResult::InvalidArgument, |m| {
            status(m.add_last_chunk(value, frame_bits))
        })
    })
}

/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_align(msg: *mut MbMessage) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        with_msg(msg, MbResult::InvalidArgument, |m| {
            m.align();
            MbResult::Ok
        })
    })
}

/// Materialize the header in front of the payload.
///
/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_encode_header(msg: *mut MbMessage) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        with_msg(msg, MbResult::InvalidArgument, |m| {
            status(m.encode_header().map(drop))
        })
    })
}

/// Parse the header of a received frame.
///
/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_decode_header(msg: *mut MbMessage) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        with_msg(msg, MbResult::InvalidArgument, |m| {
            status(m.decode_header().map(drop))
        })
    })
}

/// Read the addressing triple into `out`.
///
/// # Safety
/// `msg` must be a valid handle and `out` a valid pointer to an `MbHeader`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_get_header(msg: *mut MbMessage, out: *mut MbHeader) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        if out.is_null() {
            return error::set_invalid_argument("out cannot be null");
        }
        with_msg(msg, MbResult::InvalidArgument, |m| {
            // SAFETY: Pointer validity is guaranteed by the caller.
            unsafe { *out = m.header().into() };
            MbResult::Ok
        })
    })
}

/// Set the addressing triple. It is validated when the header is encoded.
///
/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_set_header(msg: *mut MbMessage, header: MbHeader) -> MbResult {
    crate::ffi_boundary(MbResult::Internal, || {
        error::clear_error_state();
        with_msg(msg, MbResult::InvalidArgument, |m| {
            m.set_header(header.into());
            MbResult::Ok
        })
    })
}

/// Pointer to the payload bytes; their count is stored in `out_len`.
/// The pointer stays valid until the message is modified or freed.
///
/// # Safety
/// `msg` must be a valid handle and `out_len` a valid pointer to a `usize`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_data(msg: *mut MbMessage, out_len: *mut usize) -> *const u8 {
    crate::ffi_boundary(std::ptr::null(), || {
        error::clear_error_state();
        if out_len.is_null() {
            let _ = error::set_invalid_argument("out_len cannot be null");
            return std::ptr::null();
        }
        with_msg(msg, std::ptr::null(), |m| {
            let data = m.start();
            // SAFETY: Pointer validity is guaranteed by the caller.
            unsafe { *out_len = data.len() };
            data.as_ptr()
        })
    })
}

/// Payload length in bits.
///
/// # Safety
/// `msg` must be a valid handle returned by `mb_msg_alloc`.
#[no_mangle]
pub unsafe extern "C" fn mb_msg_bit_length(msg: *mut MbMessage) -> usize {
    crate::ffi_boundary(0, || with_msg(msg, 0, |m| m.bit_length()))
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    fn last_error() -> String {
        // SAFETY: mb_last_error returns a pointer to a thread-local CString.
        unsafe { CStr::from_ptr(crate::mb_last_error()) }
            .to_str()
            .unwrap()
            .to_owned()
    }

    #[test]
    fn send_and_receive_through_handles() {
        let payload = b"hello bus";
        let header = MbHeader {
            src: 5,
            dst: -2,
            code: 17,
        };

        unsafe {
            let tx = mb_msg_alloc(0);
            assert!(!tx.is_null());
            assert_eq!(mb_msg_start_send(tx), MbResult::Ok);
            assert_eq!(mb_msg_set_header(tx, header), MbResult::Ok);
            assert_eq!(mb_msg_add_data(tx, payload.as_ptr(), payload.len()), MbResult::Ok);
            assert_eq!(mb_msg_encode_header(tx), MbResult::Ok);
            assert_eq!(mb_msg_start_extract(tx), MbResult::Ok);

            let rx = mb_msg_alloc(4);
            assert_eq!(mb_msg_start_add(rx), MbResult::Ok);
            let mut chunk = 0u32;
            while mb_msg_extract_more(tx) {
                assert_eq!(mb_msg_extract_chunk(tx, 3, &mut chunk), MbResult::Ok);
                assert_eq!(mb_msg_add_chunk(rx, chunk, 3), MbResult::Ok);
            }
            assert_eq!(mb_msg_align(rx), MbResult::Ok);
            assert_eq!(mb_msg_decode_header(rx), MbResult::Ok);

            let mut got = MbHeader::default();
            assert_eq!(mb_msg_get_header(rx, &mut got), MbResult::Ok);
            assert_eq!(got, header);

            let mut len = 0usize;
            let data = mb_msg_data(rx, &mut len);
            assert_eq!(std::slice::from_raw_parts(data, len), payload);
            assert_eq!(mb_msg_bit_length(rx), payload.len() * 8);

            mb_msg_free(tx);
            mb_msg_free(rx);
        }
    }

    #[test]
    fn null_handle_is_invalid_argument() {
        unsafe {
            assert_eq!(mb_msg_start_send(std::ptr::null_mut()), MbResult::InvalidArgument);
            assert!(last_error().contains("handle cannot be null"));
            assert!(!mb_msg_extract_more(std::ptr::null_mut()));
            mb_msg_free(std::ptr::null_mut());
        }
    }

    #[test]
    fn wide_frames_end_with_last_chunk() {
        let payload = b"hello bus";
        unsafe {
            let tx = mb_msg_alloc(0);
            let header = MbHeader {
                src: 5,
                dst: -2,
                code: 17,
            };
            assert_eq!(mb_msg_set_header(tx, header), MbResult::Ok);
            assert_eq!(mb_msg_add_data(tx, payload.as_ptr(), payload.len()), MbResult::Ok);
            assert_eq!(mb_msg_encode_header(tx), MbResult::Ok);
            assert_eq!(mb_msg_start_extract(tx), MbResult::Ok);

            let rx = mb_msg_alloc(4);
            assert_eq!(mb_msg_start_add(rx), MbResult::Ok);
            let mut chunk = 0u32;
            while mb_msg_extract_more(tx) {
                assert_eq!(mb_msg_extract_chunk(tx, 16, &mut chunk), MbResult::Ok);
                let added = if mb_msg_extract_more(tx) {
                    mb_msg_add_chunk(rx, chunk, 16)
                } else {
                    mb_msg_add_last_chunk(rx, chunk, 16)
                };
                assert_eq!(added, MbResult::Ok);
            }
            assert_ne!(chunk & (1 << 16), 0);
            assert_eq!(mb_msg_decode_header(rx), MbResult::Ok);

            let mut len = 0usize;
            let data = mb_msg_data(rx, &mut len);
            assert_eq!(std::slice::from_raw_parts(data, len), payload);

            mb_msg_free(tx);
            mb_msg_free(rx);
        }
    }

    #[test]
    fn library_errors_map_to_codes() {
        unsafe {
            let msg = mb_msg_alloc(4);
            let mut chunk = 0u32;
            assert_eq!(
                mb_msg_extract_chunk(msg, 8, &mut chunk),
                MbResult::CursorOverflow
            );
            assert_eq!(mb_msg_add_chunk(msg, 1, 0), MbResult::InvalidWidth);
            assert!(!last_error().is_empty());

            let bad = MbHeader {
                src: -1,
                dst: -1,
                code: 9,
            };
            assert_eq!(mb_msg_set_header(msg, bad), MbResult::Ok);
            assert_eq!(mb_msg_encode_header(msg), MbResult::InvalidHeaderField);
            mb_msg_free(msg);
        }
    }

    #[test]
    fn oversized_allocation_fails() {
        let msg = mb_msg_alloc(usize::from(u16::MAX));
        assert!(msg.is_null());
        assert!(last_error().starts_with("out of memory"));
    }
}

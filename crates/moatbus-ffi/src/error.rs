use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use moatbus_message::MessageError;

use crate::types::MbResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let sanitized = message.into().replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> MbResult {
    set_error_message(message);
    MbResult::InvalidArgument
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn map_message_error(err: &MessageError) -> MbResult {
    set_error_message(err.to_string());
    match err {
        MessageError::OutOfMemory { .. } => MbResult::OutOfMemory,
        MessageError::InvalidBufferOwnership => MbResult::BufferOwnership,
        MessageError::CursorOverflow { .. } => MbResult::CursorOverflow,
        MessageError::CorruptHeader(_) => MbResult::CorruptHeader,
        MessageError::InvalidHeaderField { .. } => MbResult::InvalidHeaderField,
        MessageError::InvalidWidth(_) => MbResult::InvalidWidth,
        MessageError::Detached => MbResult::Detached,
        MessageError::InvalidTransition { .. } => MbResult::InvalidTransition,
    }
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}

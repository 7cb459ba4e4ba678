use moatbus_message::{Header, Message};

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbResult {
    Ok = 0,
    InvalidArgument = 1,
    OutOfMemory = 2,
    BufferOwnership = 3,
    CursorOverflow = 4,
    CorruptHeader = 5,
    InvalidHeaderField = 6,
    InvalidWidth = 7,
    Detached = 8,
    InvalidTransition = 9,
    Internal = 99,
}

#[allow(dead_code)]
pub const MB_OK: MbResult = MbResult::Ok;
#[allow(dead_code)]
pub const MB_ERR_INVALID_ARGUMENT: MbResult = MbResult::InvalidArgument;
#[allow(dead_code)]
pub const MB_ERR_OUT_OF_MEMORY: MbResult = MbResult::OutOfMemory;
#[allow(dead_code)]
pub const MB_ERR_BUFFER_OWNERSHIP: MbResult = MbResult::BufferOwnership;
#[allow(dead_code)]
pub const MB_ERR_CURSOR_OVERFLOW: MbResult = MbResult::CursorOverflow;
#[allow(dead_code)]
pub const MB_ERR_CORRUPT_HEADER: MbResult = MbResult::CorruptHeader;
#[allow(dead_code)]
pub const MB_ERR_INVALID_HEADER_FIELD: MbResult = MbResult::InvalidHeaderField;
#[allow(dead_code)]
pub const MB_ERR_INVALID_WIDTH: MbResult = MbResult::InvalidWidth;
#[allow(dead_code)]
pub const MB_ERR_DETACHED: MbResult = MbResult::Detached;
#[allow(dead_code)]
pub const MB_ERR_INVALID_TRANSITION: MbResult = MbResult::InvalidTransition;
#[allow(dead_code)]
pub const MB_ERR_INTERNAL: MbResult = MbResult::Internal;

/// Addressing triple as seen from C.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MbHeader {
    pub src: i8,
    pub dst: i8,
    pub code: u8,
}

impl From<Header> for MbHeader {
    fn from(h: Header) -> Self {
        Self {
            src: h.src,
            dst: h.dst,
            code: h.code,
        }
    }
}

impl From<MbHeader> for Header {
    fn from(h: MbHeader) -> Self {
        Header::new(h.src, h.dst, h.code)
    }
}

/// Opaque message handle. C code only ever sees `*mut MbMessage`.
pub struct MbMessage {
    pub(crate) msg: Message<'static>,
}

use crate::outcome::Outcome;

/// Errors raised by message buffer and header operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    /// Growing an owned buffer failed or would exceed the buffer limit.
    #[error("out of memory (requested {requested} bytes, max {max})")]
    OutOfMemory { requested: usize, max: usize },

    /// Resize or release attempted on a buffer this message does not own.
    #[error("buffer is not owned by this message")]
    InvalidBufferOwnership,

    /// A cursor would pass the other cursor or the end of a fixed buffer.
    #[error("cursor overflow ({needed} bits needed, {available} available)")]
    CursorOverflow { needed: usize, available: usize },

    /// Header bytes cannot be interpreted.
    #[error("corrupt header: {0}")]
    CorruptHeader(&'static str),

    /// An address or code is outside what the header can carry.
    #[error("header field {field} out of range: {value}")]
    InvalidHeaderField { field: &'static str, value: i16 },

    /// Chunk width outside 1..=16.
    #[error("invalid chunk width {0} (expected 1..=16)")]
    InvalidWidth(u8),

    /// The message has no buffer attached yet.
    #[error("message has no buffer attached")]
    Detached,

    /// The outcome tag refuses this transition.
    #[error("invalid outcome transition {from} -> {to}")]
    InvalidTransition { from: Outcome, to: Outcome },
}

pub type Result<T> = std::result::Result<T, MessageError>;

use crate::message::MSG_MINBUF;

/// Largest owned buffer, in bytes. Peers use 16-bit buffer lengths.
pub const MAX_BUFFER: usize = u16::MAX as usize;

/// Controls how owned message buffers are sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageConfig {
    /// Payload capacity reserved at allocation, excluding the header area.
    pub initial_capacity: usize,
    /// Upper bound for the whole buffer, header area included.
    pub max_buffer: usize,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            initial_capacity: MSG_MINBUF,
            max_buffer: MAX_BUFFER,
        }
    }
}

use moatbus_message::MessageError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

/// Map a message-layer failure to an exit code.
///
/// Bad arguments (header fields, widths) are usage errors; malformed input
/// frames are invalid data.
pub fn message_error(context: &str, err: MessageError) -> CliError {
    let code = match err {
        MessageError::InvalidHeaderField { .. } | MessageError::InvalidWidth(_) => USAGE,
        MessageError::CursorOverflow { .. } | MessageError::CorruptHeader(_) => DATA_INVALID,
        MessageError::OutOfMemory { .. } => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

//! Bit-granular message buffers for MoatBus.
//!
//! A bus frame is moved in chunks of 1 to 16 bits, so a [`Message`] keeps
//! independent bit-level read and write cursors over a byte buffer:
//! - the sender appends payload bytes, materializes the header in front of
//!   them and pulls `frame_bits`-wide chunks off the read cursor;
//! - the receiver appends chunks as they arrive and parses the header back
//!   out once enough bytes are present.
//!
//! Frame layout:
//! ```text
//! ┌──────────┬──────────────┬─────────────────────┬──────────┐
//! │ reserved │ header (1-3) │ payload             │ residual │
//! │          │ src/dst/code │ (whole bytes)       │ bits     │
//! └──────────┴──────────────┴─────────────────────┴──────────┘
//!            ▲              ▲                     ▲
//!       frame start      data_off           write cursor
//! ```
//!
//! Buffers are either owned (grown on demand, returned on release) or
//! borrowed from the caller, in which case they are never resized.

mod bits;
pub mod config;
pub mod error;
pub mod header;
pub mod message;
pub mod outcome;
pub mod queue;

pub use config::{MessageConfig, MAX_BUFFER};
pub use error::{MessageError, Result};
pub use header::{decode_header, encode_header, header_len, Header, MIN_ADDRESS};
pub use message::{Message, Storage, MAX_CHUNK_BITS, MSG_MAXHDR, MSG_MINBUF};
pub use outcome::Outcome;
pub use queue::MessageQueue;

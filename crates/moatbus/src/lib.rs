//! MoatBus wire primitives.
//!
//! MoatBus moves short addressed messages over a shared multi-wire bus in
//! chunks of 1 to 16 bits. This crate bundles the layers needed on either
//! end of the wire:
//!
//! - [`crc`]: CRC8/CRC16 with byte and bit-granular updates
//! - [`message`]: bit-cursor message buffers, the 1-3 byte address header
//!   and the outcome state machine
//!
//! ```
//! use moatbus::message::{Header, Message};
//!
//! let mut tx = Message::allocate(16).unwrap();
//! tx.set_header(Header::new(1, 2, 3));
//! tx.append_bytes(b"hi").unwrap();
//! tx.encode_header().unwrap();
//! tx.start_extract();
//!
//! let mut rx = Message::allocate(16).unwrap();
//! rx.start_add();
//! while tx.has_more() {
//!     rx.add_chunk(tx.extract_chunk(4).unwrap(), 4).unwrap();
//! }
//! assert_eq!(rx.decode_header().unwrap(), Header::new(1, 2, 3));
//! assert_eq!(rx.start(), b"hi");
//! ```

/// Re-export checksum types.
pub mod crc {
    pub use moatbus_crc::*;
}

/// Re-export message types.
pub mod message {
    pub use moatbus_message::*;
}

pub use moatbus_crc::{Checksum, Crc16, Crc8};
pub use moatbus_message::{Header, Message, MessageError, Outcome};

//! Variable-length (1-3 byte) addressing header.
//!
//! The header is self-describing: the leading bit of each address field
//! says whether it is a compact reserved address (-4..=-1, two bits) or a
//! full 7-bit address. The signs of `dst`/`src` pick the message class,
//! which fixes how many bits remain for the code.
//!
//! ```text
//! dst<0  src<0   1 D D 1 S S C C                                code 0..=3
//! dst<0  src>=0  1 D D 0 S S S S | S S S C C C C C              code 0..=31
//! dst>=0 src<0   0 D D D D D D D | 1 S S C C C C C              code 0..=31
//! dst>=0 src>=0  0 D D D D D D D | 0 S S S S S S S | C x 8      code 0..=255
//! ```

use crate::error::{MessageError, Result};
use crate::message::{Message, MSG_MAXHDR};

/// Lowest address; -4..=-1 are reserved (broadcast and special) addresses.
pub const MIN_ADDRESS: i8 = -4;

const FLAG: u8 = 0x80;

/// Addressing triple of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Header {
    /// Sender address. `-4..=-1` are server addresses, `0..` are clients.
    pub src: i8,
    /// Receiver address, same ranges as `src`.
    pub dst: i8,
    /// Command code. Its range depends on the address classes, see
    /// [`Header::max_code`].
    pub code: u8,
}

impl Header {
    /// Build a header without range checks; [`encode_header`] validates.
    pub fn new(src: i8, dst: i8, code: u8) -> Self {
        Self { src, dst, code }
    }

    /// Largest code the class of this address pair can carry.
    pub fn max_code(&self) -> u8 {
        match (self.dst < 0, self.src < 0) {
            (true, true) => 0x03,
            (true, false) | (false, true) => 0x1F,
            (false, false) => 0xFF,
        }
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        match (self.dst < 0, self.src < 0) {
            (true, true) => 1,
            (false, false) => 3,
            _ => 2,
        }
    }

    fn validate(&self) -> Result<()> {
        for (field, addr) in [("src", self.src), ("dst", self.dst)] {
            if addr < MIN_ADDRESS {
                return Err(MessageError::InvalidHeaderField {
                    field,
                    value: i16::from(addr),
                });
            }
        }
        if self.code > self.max_code() {
            return Err(MessageError::InvalidHeaderField {
                field: "code",
                value: i16::from(self.code),
            });
        }
        Ok(())
    }
}

fn compact(addr: i8) -> u8 {
    (addr as u8) & 0x03
}

fn reserved(bits: u8) -> i8 {
    ((bits & 0x03) | 0xFC) as i8
}

/// Encode a header into its shortest form.
///
/// Returns the bytes and how many of them are used.
pub fn encode_header(header: &Header) -> Result<([u8; MSG_MAXHDR], usize)> {
    header.validate()?;
    let (dst, src, code) = (header.dst, header.src, header.code);

    let mut out = [0u8; MSG_MAXHDR];
    let len = match (dst < 0, src < 0) {
        (true, true) => {
            out[0] = FLAG | (compact(dst) << 5) | 0x10 | (compact(src) << 2) | code;
            1
        }
        (true, false) => {
            let src = src as u8;
            out[0] = FLAG | (compact(dst) << 5) | (src >> 3);
            out[1] = (src << 5) | code;
            2
        }
        (false, true) => {
            out[0] = dst as u8;
            out[1] = FLAG | (compact(src) << 5) | code;
            2
        }
        (false, false) => {
            out = [dst as u8, src as u8, code];
            3
        }
    };
    Ok((out, len))
}

/// Number of header bytes announced by the leading bytes of `src`.
///
/// Returns `None` until enough bytes are present to tell.
pub fn header_len(src: &[u8]) -> Option<usize> {
    let first = *src.first()?;
    if first & FLAG != 0 {
        return Some(if first & 0x10 != 0 { 1 } else { 2 });
    }
    let second = *src.get(1)?;
    Some(if second & FLAG != 0 { 2 } else { 3 })
}

/// Decode a header from the start of `src`.
///
/// Returns `Ok(None)` if `src` doesn't contain a complete header yet,
/// otherwise the header and the number of bytes it occupies.
pub fn decode_header(src: &[u8]) -> Result<Option<(Header, usize)>> {
    let len = match header_len(src) {
        Some(len) if len <= src.len() => len,
        _ => return Ok(None),
    };

    let b0 = src[0];
    let header = if b0 & FLAG != 0 {
        let dst = reserved(b0 >> 5);
        if len == 1 {
            Header::new(reserved(b0 >> 2), dst, b0 & 0x03)
        } else {
            let b1 = src[1];
            let addr = ((b0 & 0x0F) << 3) | (b1 >> 5);
            Header::new(addr as i8, dst, b1 & 0x1F)
        }
    } else {
        let dst = b0 as i8;
        let b1 = src[1];
        if len == 2 {
            Header::new(reserved(b1 >> 5), dst, b1 & 0x1F)
        } else {
            Header::new(b1 as i8, dst, src[2])
        }
    };
    Ok(Some((header, len)))
}

impl Message<'_> {
    /// Write the header for the current `src`/`dst`/`code` into the reserved
    /// area in front of the payload. Returns the header length.
    ///
    /// The read cursor moves to the new frame start.
    pub fn encode_header(&mut self) -> Result<usize> {
        let (bytes, len) = encode_header(&self.header())?;
        let (buf, data_off) = self.header_area_mut()?;
        buf[data_off - len..data_off].copy_from_slice(&bytes[..len]);
        self.set_header_len(len);
        tracing::debug!(
            src = self.src,
            dst = self.dst,
            code = self.code,
            len,
            "encoded header"
        );
        Ok(len)
    }

    /// Parse the header at the frame start into `src`/`dst`/`code`.
    ///
    /// The payload start moves past the header.
    pub fn decode_header(&mut self) -> Result<Header> {
        let (header, len) = decode_header(self.received_frame()?)?
            .ok_or(MessageError::CorruptHeader("truncated header"))?;
        self.set_header(header);
        self.set_decoded_header_len(len);
        tracing::debug!(
            src = header.src,
            dst = header.dst,
            code = header.code,
            len,
            "decoded header"
        );
        Ok(header)
    }
}

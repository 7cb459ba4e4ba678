use std::fmt;

use bytes::BytesMut;
use moatbus_crc::Checksum;

use crate::bits::{clear_tail, read_bits, write_bits};
use crate::config::MessageConfig;
use crate::error::{MessageError, Result};
use crate::header::Header;
use crate::outcome::Outcome;

/// Bytes reserved in front of the payload for the header.
pub const MSG_MAXHDR: usize = 3;

/// Smallest useful buffer for one frame, in bytes.
pub const MSG_MINBUF: usize = 30;

/// Widest chunk accepted by the chunk operations.
pub const MAX_CHUNK_BITS: u8 = 16;

/// Backing bytes of a message.
///
/// The first [`MSG_MAXHDR`] bytes are the header area; payload follows.
#[derive(Debug)]
pub enum Storage<'a> {
    /// Allocated by the message, grown on demand and freed with it.
    Owned(BytesMut),
    /// Supplied by the caller. Never resized, never freed here.
    Borrowed(&'a mut [u8]),
}

impl Storage<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Owned(buf) => buf,
            Storage::Borrowed(buf) => buf,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Storage::Owned(buf) => buf,
            Storage::Borrowed(buf) => buf,
        }
    }

    fn len(&self) -> usize {
        self.as_slice().len()
    }
}

/// A bus message with bit-granular read and write cursors.
///
/// Both cursors are absolute bit positions into the buffer. The read cursor
/// never passes the write cursor, and bits of the last partial byte beyond
/// the write cursor are always zero.
#[derive(Debug)]
pub struct Message<'a> {
    /// Source address, -4..=127. Negative values are reserved addresses.
    pub src: i8,
    /// Destination address, -4..=127.
    pub dst: i8,
    /// Message code; its range depends on the address class.
    pub code: u8,
    storage: Option<Storage<'a>>,
    max_buffer: usize,
    data_off: usize,
    hdr_len: usize,
    read_pos: usize,
    write_pos: usize,
    result: Outcome,
}

impl<'a> Message<'a> {
    /// Allocate an owned message with room for `capacity` payload bytes.
    pub fn allocate(capacity: usize) -> Result<Self> {
        Self::with_config(&MessageConfig {
            initial_capacity: capacity,
            ..MessageConfig::default()
        })
    }

    /// Allocate an owned message sized by `config`.
    pub fn with_config(config: &MessageConfig) -> Result<Self> {
        let size = config.initial_capacity.saturating_add(MSG_MAXHDR);
        if size > config.max_buffer {
            return Err(MessageError::OutOfMemory {
                requested: size,
                max: config.max_buffer,
            });
        }
        tracing::trace!(size, "allocating message buffer");
        Ok(Self::from_parts(
            Some(Storage::Owned(BytesMut::zeroed(size))),
            config.max_buffer,
            0,
        ))
    }

    /// Wrap caller memory holding `len` content bytes.
    ///
    /// `buffer` starts with the [`MSG_MAXHDR`] bytes reserved for the header;
    /// content follows. The buffer is never resized or freed by the message.
    pub fn wrap(buffer: &'a mut [u8], len: usize) -> Result<Self> {
        let needed = len.saturating_add(MSG_MAXHDR);
        if needed > buffer.len() {
            return Err(MessageError::CursorOverflow {
                needed: needed.saturating_mul(8),
                available: buffer.len() * 8,
            });
        }
        let max_buffer = buffer.len();
        Ok(Self::from_parts(
            Some(Storage::Borrowed(buffer)),
            max_buffer,
            len * 8,
        ))
    }

    fn from_parts(storage: Option<Storage<'a>>, max_buffer: usize, content_bits: usize) -> Self {
        let start = MSG_MAXHDR * 8;
        Self {
            src: 0,
            dst: 0,
            code: 0,
            storage,
            max_buffer,
            data_off: MSG_MAXHDR,
            hdr_len: 0,
            read_pos: start,
            write_pos: start + content_bits,
            result: Outcome::Working,
        }
    }

    /// Copy addressing, header length and cursors, but not the bytes.
    ///
    /// The copy has no buffer until [`Message::attach`] is called.
    pub fn duplicate<'b>(&self) -> Message<'b> {
        Message {
            src: self.src,
            dst: self.dst,
            code: self.code,
            storage: None,
            max_buffer: self.max_buffer,
            data_off: self.data_off,
            hdr_len: self.hdr_len,
            read_pos: self.read_pos,
            write_pos: self.write_pos,
            result: Outcome::Working,
        }
    }

    /// Attach a buffer to a message that has none.
    pub fn attach(&mut self, storage: Storage<'a>) -> Result<()> {
        if self.storage.is_some() {
            return Err(MessageError::InvalidBufferOwnership);
        }
        let available = storage.len() * 8;
        if available < self.write_pos {
            return Err(MessageError::CursorOverflow {
                needed: self.write_pos,
                available,
            });
        }
        self.max_buffer = match &storage {
            Storage::Owned(_) => self.max_buffer.max(storage.len()),
            Storage::Borrowed(buf) => buf.len(),
        };
        self.storage = Some(storage);
        Ok(())
    }

    /// Release the message. An owned buffer is freed, a borrowed one is left
    /// to its owner.
    pub fn release(self) {
        tracing::trace!(owned = self.is_owned(), "releasing message");
    }

    /// Detach and return the owned buffer.
    pub fn release_buffer(&mut self) -> Result<BytesMut> {
        match self.storage.take() {
            Some(Storage::Owned(buf)) => Ok(buf),
            other => {
                self.storage = other;
                tracing::warn!("refusing to release a buffer the message does not own");
                Err(MessageError::InvalidBufferOwnership)
            }
        }
    }

    /// Grow the owned buffer to at least `new_capacity` bytes, keeping its
    /// contents and both cursors.
    pub fn grow(&mut self, new_capacity: usize) -> Result<()> {
        let max_buffer = self.max_buffer;
        match &mut self.storage {
            Some(Storage::Owned(buf)) => {
                if new_capacity <= buf.len() {
                    return Ok(());
                }
                if new_capacity > max_buffer {
                    return Err(MessageError::OutOfMemory {
                        requested: new_capacity,
                        max: max_buffer,
                    });
                }
                tracing::debug!(from = buf.len(), to = new_capacity, "growing message buffer");
                buf.resize(new_capacity, 0);
                Ok(())
            }
            _ => {
                tracing::warn!("refusing to grow a buffer the message does not own");
                Err(MessageError::InvalidBufferOwnership)
            }
        }
    }

    /// Make sure the buffer covers bits up to `end_bit`.
    fn ensure_bits(&mut self, end_bit: usize) -> Result<()> {
        let needed = end_bit.div_ceil(8);
        let len = match &self.storage {
            None => return Err(MessageError::Detached),
            Some(storage) => storage.len(),
        };
        if needed <= len {
            return Ok(());
        }
        match &self.storage {
            Some(Storage::Owned(_)) => {
                if needed > self.max_buffer {
                    return Err(MessageError::OutOfMemory {
                        requested: needed,
                        max: self.max_buffer,
                    });
                }
                let target = needed.max(len.saturating_mul(2)).min(self.max_buffer);
                self.grow(target)
            }
            _ => Err(MessageError::CursorOverflow {
                needed: end_bit,
                available: len * 8,
            }),
        }
    }

    fn buf(&self) -> Result<&[u8]> {
        self.storage
            .as_ref()
            .map(Storage::as_slice)
            .ok_or(MessageError::Detached)
    }

    fn buf_mut(&mut self) -> Result<&mut [u8]> {
        self.storage
            .as_mut()
            .map(Storage::as_mut_slice)
            .ok_or(MessageError::Detached)
    }

    fn frame_start(&self) -> usize {
        self.data_off - self.hdr_len
    }

    // sender

    /// Reset the write cursor to the payload start before building a new
    /// outbound payload. Any materialized header is discarded.
    pub fn start_send(&mut self) {
        self.reset_content();
    }

    /// Append whole bytes. A partially written byte is zero-padded first.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let start = self.write_pos.div_ceil(8) * 8;
        let end = start + bytes.len() * 8;
        self.ensure_bits(end)?;

        let write_pos = self.write_pos;
        let buf = self.buf_mut()?;
        clear_tail(buf, write_pos);
        buf[start / 8..end / 8].copy_from_slice(bytes);
        self.write_pos = end;
        Ok(())
    }

    /// Append a single byte.
    pub fn append_byte(&mut self, byte: u8) -> Result<()> {
        self.append_bytes(&[byte])
    }

    /// Rewind the read cursor to the frame start (header included, if any).
    pub fn start_extract(&mut self) {
        self.read_pos = self.frame_start() * 8;
    }

    /// True while unread bits remain.
    pub fn has_more(&self) -> bool {
        self.read_pos < self.write_pos
    }

    /// Take the next `frame_bits` bits off the read cursor.
    ///
    /// A short final chunk is left-justified with zero fill. For widths up to
    /// 8 it also carries the end marker `1 << frame_bits`. Wider frames set the
    /// marker only when 8 or more bits are missing; the remaining bits are
    /// then left-justified within the low `frame_bits - 8` bits instead.
    /// [`Message::add_last_chunk`] undoes either form.
    pub fn extract_chunk(&mut self, frame_bits: u8) -> Result<u32> {
        check_width(frame_bits)?;
        let width = usize::from(frame_bits);
        let remaining = self.write_pos - self.read_pos;
        if remaining == 0 {
            return Err(MessageError::CursorOverflow {
                needed: width,
                available: 0,
            });
        }

        let take = remaining.min(width);
        let bits = read_bits(self.buf()?, self.read_pos, take);
        self.read_pos += take;

        let short = width - take;
        let chunk = match short {
            0 => bits,
            _ if width <= 8 => (bits << short) | (1u32 << width),
            1..=7 => bits << short,
            _ => (bits << (short - 8)) | (1u32 << width),
        };
        tracing::trace!(frame_bits, chunk, read_pos = self.read_pos, "extracted chunk");
        Ok(chunk)
    }

    // receiver

    /// Reset the write cursor to the payload start before receiving.
    pub fn start_add(&mut self) {
        self.reset_content();
    }

    /// Append the low `frame_bits` bits of `value`.
    pub fn add_chunk(&mut self, value: u32, frame_bits: u8) -> Result<()> {
        check_width(frame_bits)?;
        let width = usize::from(frame_bits);
        self.ensure_bits(self.write_pos + width)?;

        let write_pos = self.write_pos;
        let buf = self.buf_mut()?;
        write_bits(buf, write_pos, value, width);
        clear_tail(buf, write_pos + width);
        self.write_pos += width;
        tracing::trace!(frame_bits, value, write_pos = self.write_pos, "added chunk");
        Ok(())
    }

    /// Append the final chunk of a frame and drop its zero fill.
    ///
    /// A marked chunk wider than 8 bits only carries `frame_bits - 8` bits.
    pub fn add_last_chunk(&mut self, value: u32, frame_bits: u8) -> Result<()> {
        check_width(frame_bits)?;
        let marked = value & (1u32 << frame_bits) != 0;
        let width = if marked && frame_bits > 8 {
            frame_bits - 8
        } else {
            frame_bits
        };
        self.add_chunk(value, width)?;
        self.align();
        Ok(())
    }

    /// Move `bits` unread bits from `source` to this message's write cursor.
    pub fn add_from(&mut self, source: &mut Message<'_>, bits: usize) -> Result<()> {
        let available = source.write_pos - source.read_pos;
        if bits > available {
            return Err(MessageError::CursorOverflow {
                needed: bits,
                available,
            });
        }
        if !source.is_attached() {
            return Err(MessageError::Detached);
        }
        self.ensure_bits(self.write_pos + bits)?;

        let mut left = bits;
        while left > 0 {
            let n = left.min(usize::from(MAX_CHUNK_BITS));
            let chunk = read_bits(source.buf()?, source.read_pos, n);
            let write_pos = self.write_pos;
            write_bits(self.buf_mut()?, write_pos, chunk, n);
            source.read_pos += n;
            self.write_pos += n;
            left -= n;
        }
        let write_pos = self.write_pos;
        clear_tail(self.buf_mut()?, write_pos);
        Ok(())
    }

    /// Remove the last `frame_bits` written bits and return them.
    ///
    /// `add_chunk(value, frame_bits)` with the returned value restores the
    /// previous content and cursor.
    pub fn drop_bits(&mut self, frame_bits: u8) -> Result<u32> {
        check_width(frame_bits)?;
        let width = usize::from(frame_bits);
        let floor = self.read_pos.max(self.frame_start() * 8);
        let available = self.write_pos - floor;
        if width > available {
            return Err(MessageError::CursorOverflow {
                needed: width,
                available,
            });
        }

        let start = self.write_pos - width;
        let buf = self.buf_mut()?;
        let value = read_bits(buf, start, width);
        write_bits(buf, start, 0, width);
        self.write_pos = start;
        tracing::trace!(frame_bits, value, write_pos = start, "dropped bits");
        Ok(value)
    }

    /// Discard residual bits of an incomplete trailing byte.
    pub fn align(&mut self) {
        let aligned = self.write_pos / 8 * 8;
        if aligned == self.write_pos {
            return;
        }
        if let Some(storage) = self.storage.as_mut() {
            storage.as_mut_slice()[aligned / 8] = 0;
        }
        tracing::trace!(dropped = self.write_pos - aligned, "aligned write cursor");
        self.write_pos = aligned;
        self.read_pos = self.read_pos.min(aligned);
    }

    /// Copy the first `bit_offset` bits, counted from the frame start, into
    /// a new owned message.
    ///
    /// The copy's header is not materialized; header bits become content
    /// that [`Message::decode_header`] can parse.
    pub fn truncate_copy(&self, bit_offset: usize) -> Result<Message<'static>> {
        let start = self.frame_start();
        let available = self.write_pos - start * 8;
        if bit_offset > available {
            return Err(MessageError::CursorOverflow {
                needed: bit_offset,
                available,
            });
        }

        let bytes = bit_offset.div_ceil(8);
        let mut copy = Message::with_config(&MessageConfig {
            initial_capacity: bytes.max(MSG_MINBUF),
            ..MessageConfig::default()
        })?;
        let src = self.buf()?;
        let buf = copy.buf_mut()?;
        buf[MSG_MAXHDR..MSG_MAXHDR + bytes].copy_from_slice(&src[start..start + bytes]);
        clear_tail(buf, MSG_MAXHDR * 8 + bit_offset);
        copy.write_pos = MSG_MAXHDR * 8 + bit_offset;
        tracing::debug!(bit_offset, "salvaged truncated message");
        Ok(copy)
    }

    /// Pad to the next `frame_bits` boundary, add the "padding exceeded a
    /// byte" flag bit, then the `crc_bits`-wide checksum.
    ///
    /// Kept for interop with the older test harness framing. Materializes the
    /// header first if needed.
    pub fn fill_crc(&mut self, frame_bits: u8, crc: u16, crc_bits: u8) -> Result<()> {
        check_width(frame_bits)?;
        check_width(crc_bits)?;
        if self.hdr_len == 0 {
            self.encode_header()?;
        }

        let frame_bits = usize::from(frame_bits);
        let total = self.frame_bit_length() + 1 + usize::from(crc_bits);
        let padding = total.div_ceil(frame_bits) * frame_bits - total;
        if padding > 0 {
            self.add_chunk(0, padding as u8)?;
        }
        self.add_chunk(u32::from(padding > 7), 1)?;
        self.add_chunk(u32::from(crc), crc_bits)
    }

    /// Fold everything from the frame start to the write cursor through a
    /// checksum. A trailing partial byte is folded bit-wise.
    pub fn checksum<C: Checksum>(&self) -> Result<u16> {
        let buf = self.buf()?;
        let start = self.frame_start();
        let bits = self.write_pos - start * 8;
        let whole = bits / 8;

        let mut crc = C::default();
        crc.update_slice(&buf[start..start + whole]);
        let rest = bits % 8;
        if rest > 0 {
            let tail = read_bits(buf, (start + whole) * 8, rest);
            crc.update_bits(tail as u16, rest as u8);
        }
        Ok(crc.finish())
    }

    fn reset_content(&mut self) {
        self.data_off = MSG_MAXHDR;
        self.hdr_len = 0;
        self.write_pos = self.data_off * 8;
        self.read_pos = self.write_pos;
    }

    // header plumbing, used by the header codec

    pub(crate) fn header_area_mut(&mut self) -> Result<(&mut [u8], usize)> {
        let data_off = self.data_off;
        Ok((self.buf_mut()?, data_off))
    }

    pub(crate) fn set_header_len(&mut self, len: usize) {
        self.hdr_len = len;
        self.read_pos = self.frame_start() * 8;
    }

    pub(crate) fn received_frame(&self) -> Result<&[u8]> {
        let buf = self.buf()?;
        Ok(&buf[self.frame_start()..self.write_pos / 8])
    }

    pub(crate) fn set_decoded_header_len(&mut self, len: usize) {
        let start = self.frame_start();
        self.hdr_len = len;
        self.data_off = start + len;
    }

    // accessors

    /// Addressing triple as a [`Header`].
    pub fn header(&self) -> Header {
        Header {
            src: self.src,
            dst: self.dst,
            code: self.code,
        }
    }

    /// Replace the addressing triple.
    pub fn set_header(&mut self, header: Header) {
        self.src = header.src;
        self.dst = header.dst;
        self.code = header.code;
    }

    /// Payload bytes, including a trailing partial byte.
    pub fn start(&self) -> &[u8] {
        let end = self.write_pos.div_ceil(8);
        match &self.storage {
            Some(storage) if end > self.data_off => &storage.as_slice()[self.data_off..end],
            _ => &[],
        }
    }

    /// Header and payload bytes, including a trailing partial byte.
    pub fn frame(&self) -> &[u8] {
        let end = self.write_pos.div_ceil(8);
        match &self.storage {
            Some(storage) => &storage.as_slice()[self.frame_start()..end],
            None => &[],
        }
    }

    /// Payload length in bytes, rounded up.
    pub fn length(&self) -> usize {
        self.write_pos.div_ceil(8).saturating_sub(self.data_off)
    }

    /// Payload length in bits.
    pub fn bit_length(&self) -> usize {
        self.write_pos.saturating_sub(self.data_off * 8)
    }

    /// Header plus payload length in bits.
    pub fn frame_bit_length(&self) -> usize {
        self.write_pos - self.frame_start() * 8
    }

    /// Bits extracted since [`Message::start_extract`].
    pub fn sent_bits(&self) -> usize {
        self.read_pos.saturating_sub(self.frame_start() * 8)
    }

    /// Number of materialized header bytes.
    pub fn header_len(&self) -> usize {
        self.hdr_len
    }

    /// Byte offset of the payload in the buffer.
    pub fn data_offset(&self) -> usize {
        self.data_off
    }

    /// Size of the backing buffer in bytes; zero when detached.
    pub fn capacity(&self) -> usize {
        self.storage.as_ref().map_or(0, Storage::len)
    }

    /// True if the message owns its buffer.
    pub fn is_owned(&self) -> bool {
        matches!(self.storage, Some(Storage::Owned(_)))
    }

    /// True if a buffer is attached.
    pub fn is_attached(&self) -> bool {
        self.storage.is_some()
    }

    /// Current outcome tag.
    pub fn result(&self) -> Outcome {
        self.result
    }

    /// Move the outcome tag, enforcing the state machine.
    pub fn set_result(&mut self, to: Outcome) -> Result<()> {
        self.result = self.result.transition(to)?;
        Ok(())
    }
}

impl fmt::Display for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Msg< src:{} dst:{} code:x{:x} len:{} >",
            self.src,
            self.dst,
            self.code,
            self.length()
        )
    }
}

fn check_width(bits: u8) -> Result<()> {
    if (1..=MAX_CHUNK_BITS).contains(&bits) {
        Ok(())
    } else {
        Err(MessageError::InvalidWidth(bits))
    }
}

use moatbus_crc::{Crc16, Crc8};
use moatbus_message::Message;
use serde::Serialize;

use crate::cmd::{parse_hex, parse_number, ChecksumKind, DecodeArgs};
use crate::exit::{message_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{emit, hex, preview, OutputFormat, Report};

#[derive(Serialize)]
struct DecodeOutput {
    src: i8,
    dst: i8,
    code: u8,
    header_len: usize,
    payload: String,
    text: String,
    bit_length: usize,
    checksum: Option<String>,
    checksum_ok: Option<bool>,
}

impl Report for DecodeOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("src", self.src.to_string()),
            ("dst", self.dst.to_string()),
            ("code", self.code.to_string()),
            ("header_len", self.header_len.to_string()),
            ("payload", self.payload.clone()),
            ("text", self.text.clone()),
            ("bit_length", self.bit_length.to_string()),
        ];
        if let Some(checksum) = &self.checksum {
            rows.push(("checksum", checksum.clone()));
        }
        if let Some(ok) = self.checksum_ok {
            rows.push(("checksum_ok", ok.to_string()));
        }
        rows
    }
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let chunks = args
        .chunks
        .iter()
        .map(|c| parse_number(c))
        .collect::<CliResult<Vec<_>>>()?;

    let mut msg = receive(&chunks, args.frame_bits)?;

    let checksum = match args.checksum {
        ChecksumKind::Crc8 => Some(msg.checksum::<Crc8>().map(|c| hex(&[c as u8]))),
        ChecksumKind::Crc16 => Some(msg.checksum::<Crc16>().map(|c| hex(&c.to_be_bytes()))),
        ChecksumKind::None => None,
    }
    .transpose()
    .map_err(|err| message_error("checksum", err))?;

    let checksum_ok = match (&args.expect, &checksum) {
        (Some(expected), Some(actual)) => Some(parse_hex(expected)? == parse_hex(actual)?),
        (Some(_), None) => {
            return Err(CliError::usage("--expect needs --checksum crc8 or crc16"));
        }
        (None, _) => None,
    };

    let header = msg
        .decode_header()
        .map_err(|err| message_error("decode header", err))?;
    tracing::debug!(%msg, "decoded frame");

    let out = DecodeOutput {
        src: header.src,
        dst: header.dst,
        code: header.code,
        header_len: msg.header_len(),
        payload: hex(msg.start()),
        text: preview(msg.start()),
        bit_length: msg.bit_length(),
        checksum,
        checksum_ok,
    };
    emit(&out, format);

    if checksum_ok == Some(false) {
        tracing::warn!("checksum mismatch");
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

/// Rebuild a frame from wire chunks. A chunk carrying the end marker must be
/// the last one. Zero fill after the last chunk is dropped back to a byte
/// boundary.
fn receive(chunks: &[u32], frame_bits: u8) -> CliResult<Message<'static>> {
    let marker = 1u32 << frame_bits;
    let mut msg = Message::allocate(chunks.len() * usize::from(frame_bits) / 8)
        .map_err(|err| message_error("allocate", err))?;
    msg.start_add();

    for (i, &chunk) in chunks.iter().enumerate() {
        if chunk > marker | (marker - 1) {
            return Err(CliError::new(
                USAGE,
                format!("chunk {chunk:#x} does not fit in {frame_bits} bits"),
            ));
        }
        let last = chunk & marker != 0;
        if last && i + 1 != chunks.len() {
            return Err(CliError::new(
                DATA_INVALID,
                format!("end marker on chunk {i} of {}", chunks.len()),
            ));
        }
        let added = if i + 1 == chunks.len() {
            msg.add_last_chunk(chunk, frame_bits)
        } else {
            msg.add_chunk(chunk, frame_bits)
        };
        added.map_err(|err| message_error("add chunk", err))?;
    }
    Ok(msg)
}

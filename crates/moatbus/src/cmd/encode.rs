use moatbus_crc::{Crc16, Crc8};
use moatbus_message::{Header, Message};
use serde::Serialize;

use crate::cmd::{parse_hex, ChecksumKind, EncodeArgs};
use crate::exit::{message_error, CliResult, SUCCESS};
use crate::output::{emit, hex, OutputFormat, Report};

#[derive(Serialize)]
struct EncodeOutput {
    src: i8,
    dst: i8,
    code: u8,
    header_len: usize,
    frame: String,
    frame_bits: u8,
    bit_length: usize,
    chunks: Vec<u32>,
    checksum: Option<String>,
}

impl Report for EncodeOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let chunks = self
            .chunks
            .iter()
            .map(|c| format!("{c:#x}"))
            .collect::<Vec<_>>()
            .join(",");
        vec![
            ("src", self.src.to_string()),
            ("dst", self.dst.to_string()),
            ("code", self.code.to_string()),
            ("header_len", self.header_len.to_string()),
            ("frame", self.frame.clone()),
            ("frame_bits", self.frame_bits.to_string()),
            ("chunks", chunks),
            ("checksum", self.checksum.clone().unwrap_or_else(|| "-".into())),
        ]
    }
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = match (&args.data, &args.hex) {
        (Some(text), _) => text.as_bytes().to_vec(),
        (None, Some(digits)) => parse_hex(digits)?,
        (None, None) => Vec::new(),
    };

    let mut msg =
        Message::allocate(payload.len()).map_err(|err| message_error("allocate", err))?;
    msg.start_send();
    msg.set_header(Header::new(args.src, args.dst, args.code));
    msg.append_bytes(&payload)
        .map_err(|err| message_error("append", err))?;
    let header_len = msg
        .encode_header()
        .map_err(|err| message_error("encode header", err))?;

    let checksum = match args.checksum {
        ChecksumKind::Crc8 => Some(msg.checksum::<Crc8>().map(|c| hex(&[c as u8]))),
        ChecksumKind::Crc16 => Some(msg.checksum::<Crc16>().map(|c| hex(&c.to_be_bytes()))),
        ChecksumKind::None => None,
    }
    .transpose()
    .map_err(|err| message_error("checksum", err))?;

    msg.start_extract();
    let mut chunks = Vec::new();
    while msg.has_more() {
        chunks.push(
            msg.extract_chunk(args.frame_bits)
                .map_err(|err| message_error("extract", err))?,
        );
    }
    tracing::debug!(%msg, chunks = chunks.len(), "encoded frame");

    let out = EncodeOutput {
        src: msg.src,
        dst: msg.dst,
        code: msg.code,
        header_len,
        frame: hex(msg.frame()),
        frame_bits: args.frame_bits,
        bit_length: msg.frame_bit_length(),
        chunks,
        checksum,
    };
    emit(&out, format);
    Ok(SUCCESS)
}

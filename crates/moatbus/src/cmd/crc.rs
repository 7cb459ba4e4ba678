use moatbus_crc::{Checksum, Crc16, Crc8};
use moatbus_message::Message;
use serde::Serialize;

use crate::cmd::{parse_hex, CrcArgs};
use crate::exit::{message_error, CliResult, SUCCESS};
use crate::output::{emit, hex, OutputFormat, Report};

#[derive(Serialize)]
struct CrcOutput {
    bytes: usize,
    bits: usize,
    chunk_bits: u8,
    chunks: usize,
    crc8: String,
    crc16: String,
}

impl Report for CrcOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("bytes", self.bytes.to_string()),
            ("bits", self.bits.to_string()),
            ("chunk_bits", self.chunk_bits.to_string()),
            ("chunks", self.chunks.to_string()),
            ("crc8", self.crc8.clone()),
            ("crc16", self.crc16.clone()),
        ]
    }
}

pub fn run(args: CrcArgs, format: OutputFormat) -> CliResult<i32> {
    let data = if args.hex {
        parse_hex(&args.input)?
    } else {
        args.input.into_bytes()
    };

    let chunk_bits = args.bits.unwrap_or(8);
    let (crc8, chunks) = fold_chunks::<Crc8>(&data, chunk_bits)?;
    let (crc16, _) = fold_chunks::<Crc16>(&data, chunk_bits)?;

    let out = CrcOutput {
        bytes: data.len(),
        bits: data.len() * 8,
        chunk_bits,
        chunks,
        crc8: hex(&[crc8 as u8]),
        crc16: hex(&crc16.to_be_bytes()),
    };
    emit(&out, format);
    Ok(SUCCESS)
}

/// Feed `data` through `C` the way a receiver sees it on the wire: in
/// `chunk_bits`-wide pieces, with a short final piece.
fn fold_chunks<C: Checksum>(data: &[u8], chunk_bits: u8) -> CliResult<(u16, usize)> {
    let mut msg = Message::allocate(data.len()).map_err(|err| message_error("allocate", err))?;
    msg.append_bytes(data)
        .map_err(|err| message_error("append", err))?;
    msg.start_extract();

    let marker = 1u32 << chunk_bits;
    let mut left = msg.bit_length();
    let mut crc = C::default();
    let mut chunks = 0;
    while msg.has_more() {
        let chunk = msg
            .extract_chunk(chunk_bits)
            .map_err(|err| message_error("extract", err))?;
        // a marked wide chunk carries its bits in the low `chunk_bits - 8`
        let width = match chunk_bits {
            9.. if chunk & marker != 0 => usize::from(chunk_bits) - 8,
            _ => usize::from(chunk_bits),
        };
        let n = left.min(width);
        let value = (chunk & ((1u32 << width) - 1)) >> (width - n);
        crc.update_bits(value as u16, n as u8);
        left -= n;
        chunks += 1;
    }
    tracing::debug!(chunks, chunk_bits, "folded checksum input");
    Ok((crc.finish(), chunks))
}

use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod crc;
pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute CRC8 and CRC16 of some bytes.
    Crc(CrcArgs),
    /// Build a frame and split it into bus chunks.
    Encode(EncodeArgs),
    /// Reassemble bus chunks into a message.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Crc(args) => crc::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChecksumKind {
    Crc8,
    Crc16,
    None,
}

#[derive(Args, Debug)]
pub struct CrcArgs {
    /// Input text, or hex digits with --hex.
    pub input: String,
    /// Treat the input as hex.
    #[arg(long)]
    pub hex: bool,
    /// Fold the input in chunks of this many bits.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub bits: Option<u8>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Source address (-4..=127).
    #[arg(long, allow_negative_numbers = true)]
    pub src: i8,
    /// Destination address (-4..=127).
    #[arg(long, allow_negative_numbers = true)]
    pub dst: i8,
    /// Message code.
    #[arg(long)]
    pub code: u8,
    /// Text payload.
    #[arg(long, conflicts_with = "hex")]
    pub data: Option<String>,
    /// Hex payload.
    #[arg(long, conflicts_with = "data")]
    pub hex: Option<String>,
    /// Chunk width on the wire.
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u8).range(1..=16))]
    pub frame_bits: u8,
    /// Checksum appended to the report.
    #[arg(long, value_enum, default_value = "crc16")]
    pub checksum: ChecksumKind,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Received chunks, decimal or 0x-prefixed hex (comma-separated).
    #[arg(required = true, value_delimiter = ',')]
    pub chunks: Vec<String>,
    /// Chunk width on the wire.
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u8).range(1..=16))]
    pub frame_bits: u8,
    /// Checksum to compute over the received frame.
    #[arg(long, value_enum, default_value = "crc16")]
    pub checksum: ChecksumKind,
    /// Expected checksum (hex); mismatches exit with 60.
    #[arg(long, value_name = "HEX")]
    pub expect: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse hex digits, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if !digits.is_ascii() {
        return Err(CliError::usage(format!("invalid hex: {input}")));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::usage(format!("odd number of hex digits: {input}")));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| CliError::usage(format!("invalid hex: {input}")))
        })
        .collect()
}

/// Parse a decimal or `0x`-prefixed hex number.
pub fn parse_number(input: &str) -> CliResult<u32> {
    let input = input.trim();
    let parsed = match input.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| CliError::usage(format!("invalid number: {input}")))
}

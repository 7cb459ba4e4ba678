use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("moatbus {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("MOATBUS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("crc8_poly: {:#04x}", moatbus_crc::crc8::POLY);
    println!("crc16_poly: {:#06x}", moatbus_crc::crc16::POLY);
    println!("max_header: {} bytes", moatbus_message::MSG_MAXHDR);
    println!("max_buffer: {} bytes", moatbus_message::MAX_BUFFER);

    Ok(SUCCESS)
}

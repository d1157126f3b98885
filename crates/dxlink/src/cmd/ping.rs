use dxlink_device::PingInfo;
use serde::Serialize;

use crate::cmd::DeviceArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct PingOutput {
    port: String,
    baud_rate: u32,
    id: u8,
    #[serde(flatten)]
    info: PingInfo,
}

pub fn run(args: DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let bus = &args.bus;
    let mut session = bus.open()?;
    let info = session
        .ping(bus.id, bus.policy())
        .map_err(|err| device_error("ping failed", err))?;

    let out = PingOutput {
        port: bus.port.clone(),
        baud_rate: session.baud_rate(),
        id: bus.id,
        info,
    };
    print_record(
        &out,
        &[
            ("ID", out.id.to_string()),
            ("Model", out.info.model_number.to_string()),
            ("Firmware", out.info.firmware_version.to_string()),
            ("Baud rate", out.baud_rate.to_string()),
        ],
        format,
    );
    Ok(SUCCESS)
}

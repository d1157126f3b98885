use serde::Serialize;

use crate::cmd::DeviceArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct RebootOutput {
    id: u8,
    rebooted: bool,
}

pub fn run(args: DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let bus = &args.bus;
    let mut session = bus.open()?;
    session
        .reboot(bus.id, bus.policy())
        .map_err(|err| device_error("reboot failed", err))?;

    let out = RebootOutput {
        id: bus.id,
        rebooted: true,
    };
    print_record(
        &out,
        &[("ID", out.id.to_string()), ("Rebooted", "yes".to_string())],
        format,
    );
    Ok(SUCCESS)
}

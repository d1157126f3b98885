use clap::ValueEnum;
use dxlink_frame::FactoryResetMode;
use serde::Serialize;

use crate::cmd::FactoryResetArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct ResetOutput {
    id: u8,
    keep: String,
}

pub fn run(args: FactoryResetArgs, format: OutputFormat) -> CliResult<i32> {
    let bus = &args.bus;
    let mut session = bus.open()?;
    session
        .factory_reset(bus.id, FactoryResetMode::from(args.keep), bus.policy())
        .map_err(|err| device_error("factory reset failed", err))?;

    let out = ResetOutput {
        id: bus.id,
        keep: args
            .keep
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default(),
    };
    print_record(
        &out,
        &[("ID", out.id.to_string()), ("Kept", out.keep.clone())],
        format,
    );
    Ok(SUCCESS)
}

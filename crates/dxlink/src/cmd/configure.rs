use dxlink_device::{DeviceSettings, OperatingMode, SessionConfig};
use dxlink_transport::ResourceRegistry;

use crate::cmd::{parse_duration, ConfigureArgs};
use crate::exit::{device_error, CliError, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

pub fn run(args: ConfigureArgs, format: OutputFormat) -> CliResult<i32> {
    let mode: OperatingMode = args
        .mode
        .parse()
        .map_err(|err| CliError::usage(format!("--mode: {err}")))?;
    let settings = DeviceSettings {
        baud_rate: args.target_baud,
        return_delay_us: args.return_delay,
        operating_mode: mode,
    };

    let bus = &args.bus;
    let config = SessionConfig {
        configure_wait: parse_duration(&args.configure_wait)?,
        ..bus.session_config()?
    };
    let mut session =
        dxlink_device::open_port(&bus.port, &ResourceRegistry::new(), &bus.pins, config)
            .map_err(|err| device_error("open failed", err))?;

    let report = session
        .configure(bus.id, &settings, bus.policy())
        .map_err(|err| device_error("configure failed", err))?;

    print_record(
        &report,
        &[
            ("ID", report.id.to_string()),
            ("Found at", report.discovered_baud_rate.to_string()),
            ("Model", report.model_number.to_string()),
            ("Baud rate", report.baud_rate.to_string()),
            ("Return delay", format!("{} us", report.return_delay_us)),
            ("Operating mode", report.operating_mode.to_string()),
        ],
        format,
    );
    Ok(SUCCESS)
}

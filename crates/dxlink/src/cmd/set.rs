use dxlink_device::{DeviceError, DriveMode, OperatingMode, RetryPolicy, Session};
use dxlink_transport::SerialTransport;
use serde::Serialize;

use crate::cmd::get::quantity_name;
use crate::cmd::{Quantity, SetArgs};
use crate::exit::{device_error, CliError, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

/// A parsed value ready to be written.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Setting {
    BaudRate(u32),
    ReturnDelay(u32),
    DriveMode(DriveMode),
    OperatingMode(OperatingMode),
    Torque(bool),
    GoalCurrent(f64),
    GoalVelocity(f64),
    GoalPosition(f64),
}

#[derive(Serialize)]
struct SetOutput {
    id: u8,
    quantity: String,
    value: String,
}

pub fn run(args: SetArgs, format: OutputFormat) -> CliResult<i32> {
    let setting = parse_setting(args.quantity, &args.value)?;
    let bus = &args.bus;
    let mut session = bus.open()?;
    apply(&mut session, bus.id, setting, bus.policy())
        .map_err(|err| device_error("set failed", err))?;

    let out = SetOutput {
        id: bus.id,
        quantity: quantity_name(args.quantity),
        value: args.value.trim().to_string(),
    };
    print_record(
        &out,
        &[
            ("ID", out.id.to_string()),
            ("Quantity", out.quantity.clone()),
            ("Value", out.value.clone()),
        ],
        format,
    );
    Ok(SUCCESS)
}

fn parse_setting(quantity: Quantity, value: &str) -> CliResult<Setting> {
    let value = value.trim();
    let invalid = || {
        CliError::usage(format!(
            "'{value}' is not a valid {}",
            quantity_name(quantity)
        ))
    };
    let number = || value.parse::<f64>().map_err(|_| invalid());

    match quantity {
        Quantity::BaudRate => value.parse().map(Setting::BaudRate).map_err(|_| invalid()),
        Quantity::ReturnDelay => value.parse().map(Setting::ReturnDelay).map_err(|_| invalid()),
        Quantity::DriveMode => {
            let raw = value.parse::<u8>().map_err(|_| invalid())?;
            DriveMode::try_from_raw(raw)
                .map(Setting::DriveMode)
                .map_err(|err| CliError::usage(err.to_string()))
        }
        Quantity::OperatingMode => value
            .parse()
            .map(Setting::OperatingMode)
            .map_err(|_| invalid()),
        Quantity::Torque => match value.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" => Ok(Setting::Torque(true)),
            "off" | "false" | "0" => Ok(Setting::Torque(false)),
            _ => Err(invalid()),
        },
        Quantity::GoalCurrent => number().map(Setting::GoalCurrent),
        Quantity::GoalVelocity => number().map(Setting::GoalVelocity),
        Quantity::GoalPosition => number().map(Setting::GoalPosition),
        _ => Err(CliError::usage(format!(
            "{} is read-only",
            quantity_name(quantity)
        ))),
    }
}

fn apply<T: SerialTransport>(
    session: &mut Session<T>,
    id: u8,
    setting: Setting,
    policy: RetryPolicy,
) -> Result<(), DeviceError> {
    match setting {
        Setting::BaudRate(baud) => session.set_device_baud_rate(id, baud, policy),
        Setting::ReturnDelay(us) => session.set_return_delay_time(id, us, policy),
        Setting::DriveMode(mode) => session.set_drive_mode(id, mode, policy),
        Setting::OperatingMode(mode) => session.set_operating_mode(id, mode, policy),
        Setting::Torque(on) => session.set_torque_enabled(id, on, policy),
        Setting::GoalCurrent(ma) => session.set_goal_current(id, ma, policy),
        Setting::GoalVelocity(rpm) => session.set_goal_velocity(id, rpm, policy),
        Setting::GoalPosition(deg) => session.set_goal_position(id, deg, policy),
    }
}

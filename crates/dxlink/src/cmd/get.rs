use clap::ValueEnum;
use dxlink_device::{DeviceError, RetryPolicy, Session};
use dxlink_transport::SerialTransport;
use serde::Serialize;
use serde_json::{json, Value};

use crate::cmd::{GetArgs, Quantity};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct GetOutput {
    id: u8,
    quantity: String,
    value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<&'static str>,
}

pub fn run(args: GetArgs, format: OutputFormat) -> CliResult<i32> {
    let bus = &args.bus;
    let mut session = bus.open()?;
    let value = read_quantity(&mut session, bus.id, args.quantity, bus.policy())
        .map_err(|err| device_error("get failed", err))?;

    let out = GetOutput {
        id: bus.id,
        quantity: quantity_name(args.quantity),
        unit: args.quantity.unit(),
        value,
    };
    print_record(
        &out,
        &[
            ("ID", out.id.to_string()),
            ("Quantity", out.quantity.clone()),
            ("Value", display_value(&out.value, out.unit)),
        ],
        format,
    );
    Ok(SUCCESS)
}

pub fn read_quantity<T: SerialTransport>(
    session: &mut Session<T>,
    id: u8,
    quantity: Quantity,
    policy: RetryPolicy,
) -> Result<Value, DeviceError> {
    Ok(match quantity {
        Quantity::ModelNumber => json!(session.model_number(id, policy)?),
        Quantity::FirmwareVersion => json!(session.firmware_version(id, policy)?),
        Quantity::BaudRate => json!(session.device_baud_rate(id, policy)?),
        Quantity::ReturnDelay => json!(session.return_delay_time(id, policy)?),
        Quantity::DriveMode => json!(session.drive_mode(id, policy)?),
        Quantity::OperatingMode => json!(session.operating_mode(id, policy)?.to_string()),
        Quantity::Torque => json!(session.torque_enabled(id, policy)?),
        Quantity::GoalCurrent => json!(session.goal_current(id, policy)?),
        Quantity::GoalVelocity => json!(session.goal_velocity(id, policy)?),
        Quantity::GoalPosition => json!(session.goal_position(id, policy)?),
        Quantity::PresentCurrent => json!(session.present_current(id, policy)?),
        Quantity::PresentVelocity => json!(session.present_velocity(id, policy)?),
        Quantity::PresentPosition => json!(session.present_position(id, policy)?),
        Quantity::PresentTemperature => json!(session.present_temperature(id, policy)?),
    })
}

pub fn quantity_name(quantity: Quantity) -> String {
    quantity
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

fn display_value(value: &Value, unit: Option<&str>) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_u64() && !n.is_i64() => format!("{f:.3}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    };
    match unit {
        Some(unit) => format!("{text} {unit}"),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use dxlink_device::open;
    use dxlink_transport::{ResourceRegistry, ScriptedTransport};

    use super::*;

    #[test]
    fn reads_temperature_over_scripted_bus() {
        let reply = [
            0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x05, 0x00, 0x55, 0x00, 0x32, 0xFC, 0xA1,
        ];
        let mut session = open(
            ScriptedTransport::new("bus").reply(&reply),
            &ResourceRegistry::new(),
        )
        .unwrap();
        let value = read_quantity(
            &mut session,
            1,
            Quantity::PresentTemperature,
            RetryPolicy::default(),
        )
        .unwrap();
        assert_eq!(value, json!(50));
    }

    #[test]
    fn names_are_kebab_case() {
        assert_eq!(quantity_name(Quantity::PresentPosition), "present-position");
    }

    #[test]
    fn display_adds_unit() {
        assert_eq!(display_value(&json!(323.576), Some("deg")), "323.576 deg");
        assert_eq!(display_value(&json!(50), Some("C")), "50 C");
        assert_eq!(display_value(&json!(true), None), "true");
    }
}

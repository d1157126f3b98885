use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use dxlink_device::{open_port, RetryPolicy, Session, SessionConfig};
use dxlink_frame::FactoryResetMode;
use dxlink_transport::{LineSettings, ResourceRegistry, SerialPortTransport, DEFAULT_BAUD_RATE};

use crate::exit::{device_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod configure;
pub mod factory_reset;
pub mod get;
pub mod monitor;
pub mod ping;
pub mod ports;
pub mod read;
pub mod reboot;
pub mod set;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that a device answers and show its model.
    Ping(DeviceArgs),
    /// Read raw bytes from the control table.
    Read(ReadArgs),
    /// Write raw bytes to the control table.
    Write(WriteArgs),
    /// Read a named quantity in physical units.
    Get(GetArgs),
    /// Write a named quantity in physical units.
    Set(SetArgs),
    /// Find a device's baud rate and apply standard settings.
    Configure(ConfigureArgs),
    /// Print present position until interrupted.
    Monitor(MonitorArgs),
    /// Restart a device.
    Reboot(DeviceArgs),
    /// Restore factory settings.
    FactoryReset(FactoryResetArgs),
    /// List serial ports.
    Ports,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ping(args) => ping::run(args, format),
        Command::Read(args) => read::run(args, format),
        Command::Write(args) => write::run(args, format),
        Command::Get(args) => get::run(args, format),
        Command::Set(args) => set::run(args, format),
        Command::Configure(args) => configure::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Reboot(args) => reboot::run(args, format),
        Command::FactoryReset(args) => factory_reset::run(args, format),
        Command::Ports => ports::run(format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the bus is and how hard to try.
#[derive(Args, Debug, Clone)]
pub struct BusArgs {
    /// Serial device (e.g. /dev/ttyUSB0).
    #[arg(long, short = 'p', env = "DXLINK_PORT")]
    pub port: String,
    /// Line baud rate.
    #[arg(long, short = 'b', env = "DXLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Device ID.
    #[arg(long, default_value_t = 1)]
    pub id: u8,
    /// Base wait for a status packet (e.g. 500us, 2ms).
    #[arg(long, default_value = "500us")]
    pub wait: String,
    /// Scale the wait by this factor; 0 keeps the base wait.
    #[arg(long, default_value_t = 0)]
    pub wait_multiplier: u32,
    /// Attempts per exchange; 0 uses the default.
    #[arg(long, default_value_t = 0)]
    pub iterations: u32,
    /// Direction-control GPIO line to reserve (repeatable).
    #[arg(long = "pin", value_name = "PIN")]
    pub pins: Vec<u32>,
}

impl BusArgs {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.wait_multiplier, self.iterations)
    }

    pub fn session_config(&self) -> CliResult<SessionConfig> {
        Ok(SessionConfig {
            line: LineSettings::with_baud_rate(self.baud),
            wait: parse_duration(&self.wait)?,
            ..SessionConfig::default()
        })
    }

    pub fn open(&self) -> CliResult<Session<SerialPortTransport>> {
        let config = self.session_config()?;
        open_port(&self.port, &ResourceRegistry::new(), &self.pins, config)
            .map_err(|err| device_error("open failed", err))
    }
}

#[derive(Args, Debug)]
pub struct DeviceArgs {
    #[command(flatten)]
    pub bus: BusArgs,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    /// Control table address.
    pub address: u16,
    /// Number of bytes.
    pub length: usize,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    /// Control table address.
    pub address: u16,
    /// Bytes in hex, separate or run together (e.g. `68 0D` or `680D`).
    #[arg(required = true, num_args = 1..)]
    pub data: Vec<String>,
}

/// A control table quantity addressable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Quantity {
    ModelNumber,
    FirmwareVersion,
    BaudRate,
    ReturnDelay,
    DriveMode,
    OperatingMode,
    Torque,
    GoalCurrent,
    GoalVelocity,
    GoalPosition,
    PresentCurrent,
    PresentVelocity,
    PresentPosition,
    PresentTemperature,
}

impl Quantity {
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::BaudRate => Some("bps"),
            Self::ReturnDelay => Some("us"),
            Self::GoalCurrent | Self::PresentCurrent => Some("mA"),
            Self::GoalVelocity | Self::PresentVelocity => Some("rpm"),
            Self::GoalPosition | Self::PresentPosition => Some("deg"),
            Self::PresentTemperature => Some("C"),
            _ => None,
        }
    }
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    pub quantity: Quantity,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    pub quantity: Quantity,
    pub value: String,
}

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    /// Baud rate to leave the device and line on.
    #[arg(long, default_value_t = 1_000_000)]
    pub target_baud: u32,
    /// Return delay time in microseconds.
    #[arg(long, default_value_t = 0)]
    pub return_delay: u32,
    /// Operating mode name or code.
    #[arg(long, default_value = "position")]
    pub mode: String,
    /// Base wait per configure exchange (e.g. 100ms).
    #[arg(long, default_value = "100ms")]
    pub configure_wait: String,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    /// Time between samples (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub interval: String,
    /// Exit after N samples.
    #[arg(long)]
    pub count: Option<usize>,
}

/// What a factory reset leaves untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResetKeep {
    Nothing,
    Id,
    IdAndBaud,
}

impl From<ResetKeep> for FactoryResetMode {
    fn from(keep: ResetKeep) -> Self {
        match keep {
            ResetKeep::Nothing => FactoryResetMode::All,
            ResetKeep::Id => FactoryResetMode::ExceptId,
            ResetKeep::IdAndBaud => FactoryResetMode::ExceptIdAndBaudRate,
        }
    }
}

#[derive(Args, Debug)]
pub struct FactoryResetArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    /// Settings to keep.
    #[arg(long, value_enum, default_value_t = ResetKeep::Nothing)]
    pub keep: ResetKeep,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500us`, `2ms`, `1s`, or a bare number of milliseconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("us") {
        (num, "us")
    } else if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(match unit {
        "us" => Duration::from_micros(value),
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}

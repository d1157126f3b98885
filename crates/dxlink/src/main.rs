mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "dxlink", version, about = "Half-duplex servo bus tool")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::Quantity;

    #[test]
    fn parses_read_subcommand() {
        let cli = Cli::try_parse_from([
            "dxlink", "read", "--port", "/dev/ttyUSB0", "--id", "3", "132", "4",
        ])
        .expect("read args should parse");

        match cli.command {
            Command::Read(args) => {
                assert_eq!(args.bus.id, 3);
                assert_eq!(args.address, 132);
                assert_eq!(args.length, 4);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_get_quantity() {
        let cli = Cli::try_parse_from([
            "dxlink",
            "get",
            "--port",
            "/dev/ttyUSB0",
            "present-position",
        ])
        .expect("get args should parse");
        assert!(matches!(
            cli.command,
            Command::Get(args) if args.quantity == Quantity::PresentPosition
        ));
    }

    #[test]
    fn write_requires_data() {
        let err = Cli::try_parse_from(["dxlink", "write", "--port", "/dev/ttyUSB0", "116"])
            .expect_err("missing data should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn retry_flags_build_policy() {
        let cli = Cli::try_parse_from([
            "dxlink",
            "ping",
            "--port",
            "/dev/ttyUSB0",
            "--wait-multiplier",
            "98",
            "--iterations",
            "2",
        ])
        .expect("ping args should parse");
        let Command::Ping(args) = cli.command else {
            panic!("expected ping");
        };
        let policy = args.bus.policy();
        assert_eq!(policy.wait_multiplier, 98);
        assert_eq!(policy.iterations, 2);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::cmd::{parse_duration, MonitorArgs};
use crate::exit::{device_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{now_unix_millis, print_record, OutputFormat};

#[derive(Serialize)]
struct Sample {
    timestamp_ms: u64,
    id: u8,
    position_deg: f64,
}

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let bus = &args.bus;
    let mut session = bus.open()?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    let mut failures = 0u32;

    while running.load(Ordering::SeqCst) {
        match session.present_position(bus.id, bus.policy()) {
            Ok(position_deg) => {
                failures = 0;
                let sample = Sample {
                    timestamp_ms: now_unix_millis(),
                    id: bus.id,
                    position_deg,
                };
                print_record(
                    &sample,
                    &[
                        ("Time", sample.timestamp_ms.to_string()),
                        ("Position", format!("{position_deg:.3} deg")),
                    ],
                    format,
                );
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    return Ok(SUCCESS);
                }
            }
            // Isolated lost samples are logged and skipped.
            Err(err) if failures < MAX_CONSECUTIVE_FAILURES => {
                failures += 1;
                warn!(id = bus.id, error = %err, "sample failed");
            }
            Err(err) => return Err(device_error("monitor failed", err)),
        }
        std::thread::sleep(interval);
    }

    Ok(SUCCESS)
}

const MAX_CONSECUTIVE_FAILURES: u32 = 3;

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

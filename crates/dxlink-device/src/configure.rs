//! Bring a device of unknown baud rate onto known settings.

use std::time::Duration;

use dxlink_frame::FrameError;
use dxlink_transport::SerialTransport;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DeviceSettings;
use crate::error::{ConfigureStep, DeviceError, Result};
use crate::instructions::PingInfo;
use crate::registers::{
    baud_code, return_delay_to_raw, OperatingMode, BAUD_RATE, CANDIDATE_BAUD_RATES,
    OPERATING_MODE, RETURN_DELAY_TIME, TORQUE_ENABLE,
};
use crate::retry::RetryPolicy;
use crate::session::Session;

/// Steps run after discovery, in order.
const STEPS: [ConfigureStep; 5] = [
    ConfigureStep::DisableTorque,
    ConfigureStep::WriteBaudRate,
    ConfigureStep::SwitchTransportBaudRate,
    ConfigureStep::WriteReturnDelay,
    ConfigureStep::WriteOperatingMode,
];

/// Result of a successful [`Session::configure`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigureReport {
    pub id: u8,
    /// Baud rate the device answered on before configuration.
    pub discovered_baud_rate: u32,
    pub model_number: u16,
    pub firmware_version: u8,
    pub baud_rate: u32,
    pub return_delay_us: u32,
    pub operating_mode: OperatingMode,
}

// Values written by the steps, validated before any bus traffic.
struct Plan {
    baud_rate: u32,
    baud_code: u8,
    return_delay: u8,
    operating_mode: OperatingMode,
}

impl<T: SerialTransport> Session<T> {
    /// Find device `id`, then apply `settings`.
    ///
    /// Discovery pings once per candidate rate. Every later step runs under
    /// `policy`. Each attempt waits `policy.wait(config.configure_wait)`.
    /// The first failing step aborts the sequence and is reported as
    /// [`DeviceError::Configure`].
    pub fn configure(
        &mut self,
        id: u8,
        settings: &DeviceSettings,
        policy: RetryPolicy,
    ) -> Result<ConfigureReport> {
        let plan = Plan {
            baud_rate: settings.baud_rate,
            baud_code: baud_code(settings.baud_rate)?,
            return_delay: return_delay_to_raw(settings.return_delay_us)?,
            operating_mode: settings.operating_mode,
        };
        let wait = policy.wait(self.config().configure_wait);

        let (discovered, ping) = self
            .discover_baud_rate(id, wait)
            .map_err(|err| err.in_step(ConfigureStep::DiscoverBaudRate))?;

        for step in STEPS {
            info!(id, %step, "configure step");
            self.run_step(step, id, &plan, policy, wait)
                .map_err(|err| err.in_step(step))?;
        }

        info!(id, baud_rate = plan.baud_rate, "device configured");
        Ok(ConfigureReport {
            id,
            discovered_baud_rate: discovered,
            model_number: ping.model_number,
            firmware_version: ping.firmware_version,
            baud_rate: plan.baud_rate,
            return_delay_us: settings.return_delay_us,
            operating_mode: plan.operating_mode,
        })
    }

    /// Sweep the candidate baud rates until device `id` answers a ping.
    ///
    /// Leaves the transport on the rate that answered. If none did, the error
    /// of the last ping is returned.
    pub fn discover_baud_rate(&mut self, id: u8, wait: Duration) -> Result<(u32, PingInfo)> {
        let mut last_err = DeviceError::Frame(FrameError::NoResponse { wait });
        for baud_rate in CANDIDATE_BAUD_RATES {
            self.set_baud_rate(baud_rate)?;
            match self.ping_once(id, wait) {
                Ok(ping) => {
                    info!(id, baud_rate, "device found");
                    return Ok((baud_rate, ping));
                }
                Err(err) => {
                    debug!(id, baud_rate, error = %err, "no device at baud rate");
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }

    fn run_step(
        &mut self,
        step: ConfigureStep,
        id: u8,
        plan: &Plan,
        policy: RetryPolicy,
        wait: Duration,
    ) -> Result<()> {
        let (address, value) = match step {
            ConfigureStep::DisableTorque => (TORQUE_ENABLE.address, 0),
            ConfigureStep::WriteBaudRate => (BAUD_RATE.address, plan.baud_code),
            ConfigureStep::WriteReturnDelay => (RETURN_DELAY_TIME.address, plan.return_delay),
            ConfigureStep::WriteOperatingMode => {
                (OPERATING_MODE.address, plan.operating_mode.code())
            }
            ConfigureStep::SwitchTransportBaudRate => {
                self.set_baud_rate(plan.baud_rate)?;
                return Ok(());
            }
            ConfigureStep::DiscoverBaudRate => return Ok(()),
        };
        self.retry_with_wait(policy, wait, |s| s.write_once(id, address, &[value], wait))
    }
}

#[cfg(test)]
mod tests {
    use dxlink_transport::{ResourceRegistry, ScriptedTransport};

    use super::*;
    use crate::config::DEFAULT_CONFIGURE_WAIT;
    use crate::connector::open;
    use crate::error::Outcome;

    const PING_RESPONSE: [u8; 14] = [
        0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x07, 0x00, 0x55, 0x00, 0x06, 0x04, 0x26, 0x65, 0x5D,
    ];
    const WRITE_ACK: [u8; 11] = [
        0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x04, 0x00, 0x55, 0x00, 0xA1, 0x0C,
    ];

    fn acks(t: ScriptedTransport, n: usize) -> ScriptedTransport {
        (0..n).fold(t, |t, _| t.reply(&WRITE_ACK))
    }

    #[test]
    fn sweep_finds_device_then_writes_settings() {
        let t = ScriptedTransport::new("bus").silence().reply(&PING_RESPONSE);
        let mut s = open(acks(t, 4), &ResourceRegistry::new()).unwrap();

        let report = s
            .configure(1, &DeviceSettings::default(), RetryPolicy::default())
            .unwrap();
        assert_eq!(report.discovered_baud_rate, 57_600);
        assert_eq!(report.model_number, 0x0406);
        assert_eq!(report.baud_rate, 1_000_000);
        assert_eq!(s.baud_rate(), 1_000_000);
        assert_eq!(
            s.get_ref().baud_changes(),
            &[57_600, 9_600, 57_600, 1_000_000]
        );

        let writes: Vec<Vec<u8>> = s.get_ref().sent()[2..]
            .iter()
            .map(|frame| frame[8..11].to_vec())
            .collect();
        assert_eq!(
            writes,
            vec![
                vec![64, 0, 0],
                vec![8, 0, 3],
                vec![9, 0, 0],
                vec![11, 0, 3],
            ]
        );
    }

    #[test]
    fn configure_waits_use_configure_wait() {
        let t = ScriptedTransport::new("bus").reply(&PING_RESPONSE);
        let mut s = open(acks(t, 4), &ResourceRegistry::new()).unwrap();
        s.configure(1, &DeviceSettings::default(), RetryPolicy::default())
            .unwrap();
        assert!(s
            .get_ref()
            .waits()
            .iter()
            .all(|&w| w == DEFAULT_CONFIGURE_WAIT));
    }

    #[test]
    fn failing_step_aborts_and_is_named() {
        let t = ScriptedTransport::new("bus")
            .reply(&PING_RESPONSE)
            .reply(&WRITE_ACK)
            .silence_n(2);
        let mut s = open(t, &ResourceRegistry::new()).unwrap();

        let err = s
            .configure(1, &DeviceSettings::default(), RetryPolicy::new(0, 2))
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Configure {
                step: ConfigureStep::WriteBaudRate,
                ..
            }
        ));
        assert_eq!(err.outcome(), Outcome::NoResponse);
        // Ping, torque, two baud-rate attempts; nothing after the failure.
        assert_eq!(s.get_ref().sent().len(), 4);
        assert_eq!(s.baud_rate(), 9_600);
    }

    #[test]
    fn no_device_reports_discovery_failure() {
        let t = ScriptedTransport::new("bus").silence_n(CANDIDATE_BAUD_RATES.len());
        let mut s = open(t, &ResourceRegistry::new()).unwrap();

        let err = s
            .configure(1, &DeviceSettings::default(), RetryPolicy::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Configure {
                step: ConfigureStep::DiscoverBaudRate,
                ..
            }
        ));
        assert_eq!(s.get_ref().sent().len(), CANDIDATE_BAUD_RATES.len());
        assert_eq!(s.baud_rate(), 4_000_000);
    }

    #[test]
    fn invalid_settings_rejected_before_bus_traffic() {
        let mut s = open(ScriptedTransport::new("bus"), &ResourceRegistry::new()).unwrap();
        let settings = DeviceSettings {
            baud_rate: 250_000,
            ..DeviceSettings::default()
        };
        let err = s
            .configure(1, &settings, RetryPolicy::default())
            .unwrap_err();
        assert!(matches!(err, DeviceError::UnsupportedBaudRate(250_000)));

        let settings = DeviceSettings {
            return_delay_us: 600,
            ..DeviceSettings::default()
        };
        assert!(s.configure(1, &settings, RetryPolicy::default()).is_err());
        assert!(s.get_ref().sent().is_empty());
        assert_eq!(s.get_ref().baud_changes(), &[57_600]);
    }
}

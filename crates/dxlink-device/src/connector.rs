use dxlink_transport::{Resource, ResourceGuard, ResourceRegistry, SerialTransport};
use tracing::info;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::session::Session;

/// Open a session on `transport` with default configuration.
pub fn open<T: SerialTransport>(transport: T, registry: &ResourceRegistry) -> Result<Session<T>> {
    open_with_config(transport, registry, &[], SessionConfig::default())
}

/// Open a session with explicit configuration.
///
/// The transport and every direction-control pin in `pins` are claimed in
/// `registry` first; if any is already held the session is not created.
/// The line is then configured from `config.line`.
pub fn open_with_config<T: SerialTransport>(
    transport: T,
    registry: &ResourceRegistry,
    pins: &[u32],
    config: SessionConfig,
) -> Result<Session<T>> {
    let claim = claim(registry, transport.name(), pins)?;
    start(transport, config, claim)
}

/// Open a session on a serial device path.
///
/// The claim is taken before the device is opened, so a conflicting session
/// never touches the port.
#[cfg(feature = "serial")]
pub fn open_port(
    path: &str,
    registry: &ResourceRegistry,
    pins: &[u32],
    config: SessionConfig,
) -> Result<Session<dxlink_transport::SerialPortTransport>> {
    let claim = claim(registry, path, pins)?;
    let transport = dxlink_transport::SerialPortTransport::open(path, &config.line)?;
    start(transport, config, claim)
}

/// Apply `config.line` and record the baud rate the transport reports back.
fn start<T: SerialTransport>(
    mut transport: T,
    config: SessionConfig,
    claim: ResourceGuard,
) -> Result<Session<T>> {
    let baud_rate = transport.configure(&config.line)?;
    info!(
        port = transport.name(),
        line = %config.line,
        baud_rate,
        "session opened"
    );
    Ok(Session::from_parts(transport, config, baud_rate, claim))
}

fn claim(registry: &ResourceRegistry, name: &str, pins: &[u32]) -> Result<ResourceGuard> {
    let resources: Vec<Resource> = std::iter::once(Resource::Transport(name.to_string()))
        .chain(pins.iter().map(|&pin| Resource::Pin(pin)))
        .collect();
    Ok(registry.claim(&resources)?)
}

#![cfg(all(unix, feature = "cli"))]

use std::process::Command;

fn dxlink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dxlink"));
    cmd.env_remove("DXLINK_PORT").env_remove("DXLINK_BAUD");
    cmd
}

fn missing_port() -> String {
    format!(
        "/dev/dxlink-missing-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    )
}

#[test]
fn version_prints_package_version() {
    let output = dxlink().arg("version").output().expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("dxlink {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn ping_on_missing_port_is_transport_error() {
    let port = missing_port();
    let output = dxlink()
        .args(["--log-level", "error", "ping", "--port", &port])
        .output()
        .expect("ping should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(&port));
}

#[test]
fn port_from_environment() {
    let port = missing_port();
    let output = dxlink()
        .env("DXLINK_PORT", &port)
        .args(["get", "present-temperature"])
        .output()
        .expect("get should run");

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn bad_wait_is_usage_error() {
    let output = dxlink()
        .args(["ping", "--port", "/dev/null", "--wait", "soon"])
        .output()
        .expect("ping should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn read_only_quantity_rejected_before_opening_port() {
    let port = missing_port();
    let output = dxlink()
        .args(["set", "--port", &port, "present-position", "10"])
        .output()
        .expect("set should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_port_argument_is_clap_usage_error() {
    let output = dxlink().arg("ping").output().expect("ping should run");
    assert_eq!(output.status.code(), Some(2));
}

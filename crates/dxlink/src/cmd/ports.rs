use dxlink_transport::available_ports;
use serde::Serialize;

use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_rows, OutputFormat};

#[derive(Serialize)]
struct PortOutput {
    name: String,
    kind: String,
}

pub fn run(format: OutputFormat) -> CliResult<i32> {
    let ports: Vec<PortOutput> = available_ports()
        .map_err(|err| transport_error("port enumeration failed", err))?
        .into_iter()
        .map(|p| PortOutput {
            name: p.name,
            kind: p.kind,
        })
        .collect();

    let rows: Vec<Vec<String>> = ports
        .iter()
        .map(|p| vec![p.name.clone(), p.kind.clone()])
        .collect();
    print_rows(&ports, &["PORT", "TYPE"], &rows, format);
    Ok(SUCCESS)
}

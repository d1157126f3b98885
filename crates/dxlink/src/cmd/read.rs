use serde::Serialize;

use crate::cmd::ReadArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{hex, print_raw, print_record, OutputFormat};

#[derive(Serialize)]
struct ReadOutput {
    id: u8,
    address: u16,
    length: usize,
    data: Vec<u8>,
}

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let bus = &args.bus;
    let mut session = bus.open()?;
    let data = session
        .read(bus.id, args.address, args.length, bus.policy())
        .map_err(|err| device_error("read failed", err))?;

    if let OutputFormat::Raw = format {
        print_raw(&data);
        return Ok(SUCCESS);
    }

    let out = ReadOutput {
        id: bus.id,
        address: args.address,
        length: data.len(),
        data: data.to_vec(),
    };
    print_record(
        &out,
        &[
            ("ID", out.id.to_string()),
            ("Address", out.address.to_string()),
            ("Data", hex(&out.data)),
        ],
        format,
    );
    Ok(SUCCESS)
}

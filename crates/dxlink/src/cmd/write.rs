use serde::Serialize;

use crate::cmd::WriteArgs;
use crate::exit::{device_error, CliError, CliResult, SUCCESS};
use crate::output::{hex, print_record, OutputFormat};

#[derive(Serialize)]
struct WriteOutput {
    id: u8,
    address: u16,
    data: Vec<u8>,
}

pub fn run(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    let data = parse_hex(&args.data)?;
    let bus = &args.bus;
    let mut session = bus.open()?;
    session
        .write(bus.id, args.address, &data, bus.policy())
        .map_err(|err| device_error("write failed", err))?;

    let out = WriteOutput {
        id: bus.id,
        address: args.address,
        data,
    };
    print_record(
        &out,
        &[
            ("ID", out.id.to_string()),
            ("Address", out.address.to_string()),
            ("Written", hex(&out.data)),
        ],
        format,
    );
    Ok(SUCCESS)
}

/// Parse hex bytes given as separate words (`68 0D`), run together
/// (`680D`), with or without a `0x` prefix.
fn parse_hex(words: &[String]) -> CliResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for word in words {
        let digits = word
            .strip_prefix("0x")
            .or_else(|| word.strip_prefix("0X"))
            .unwrap_or(word);
        if digits.is_empty() || digits.len() % 2 != 0 {
            return Err(CliError::usage(format!(
                "'{word}' is not a whole number of hex bytes"
            )));
        }
        for i in (0..digits.len()).step_by(2) {
            let pair = digits
                .get(i..i + 2)
                .ok_or_else(|| CliError::usage(format!("'{word}' is not valid hex")))?;
            let byte = u8::from_str_radix(pair, 16)
                .map_err(|_| CliError::usage(format!("'{word}' is not valid hex")))?;
            bytes.push(byte);
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn separate_and_joined_words() {
        assert_eq!(
            parse_hex(&words(&["68", "0d", "0x0000"])).unwrap(),
            vec![0x68, 0x0D, 0x00, 0x00]
        );
    }

    #[test]
    fn rejects_odd_length_and_bad_digits() {
        assert!(parse_hex(&words(&["680"])).is_err());
        assert!(parse_hex(&words(&["zz"])).is_err());
        assert!(parse_hex(&words(&["0x"])).is_err());
    }
}

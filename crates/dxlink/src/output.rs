use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Print one result. `fields` is the human-readable rendering of `record`,
/// used by every format except JSON.
pub fn print_record<T: Serialize>(record: &T, fields: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(record)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (name, value) in fields {
                table.add_row(vec![name.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", pretty_line(fields)),
        OutputFormat::Raw => {
            let values: Vec<&str> = fields.iter().map(|(_, v)| v.as_str()).collect();
            println!("{}", values.join(" "));
        }
    }
}

/// Print a list of results, one row each.
pub fn print_rows<T: Serialize>(
    records: &[T],
    headers: &[&str],
    rows: &[Vec<String>],
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            for record in records {
                println!("{}", to_json(record));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(headers.to_vec());
            for row in rows {
                table.add_row(row.clone());
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                let fields: Vec<(&str, String)> =
                    headers.iter().copied().zip(row.iter().cloned()).collect();
                println!("{}", pretty_line(&fields));
            }
        }
        OutputFormat::Raw => {
            for row in rows {
                if let Some(first) = row.first() {
                    println!("{first}");
                }
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Space-separated uppercase hex, e.g. `5D 0E 00 00`.
pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn pretty_line(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(name, value)| format!("{}={value}", name.to_lowercase().replace(' ', "_")))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_formatting() {
        assert_eq!(hex(&[0x5D, 0x0E, 0x00, 0x00]), "5D 0E 00 00");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn pretty_line_uses_snake_keys() {
        let fields = [("Model", "1030".to_string()), ("Baud rate", "57600".to_string())];
        assert_eq!(pretty_line(&fields), "model=1030 baud_rate=57600");
    }
}

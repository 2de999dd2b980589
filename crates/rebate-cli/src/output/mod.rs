pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Keys whose array values hold one object per tier or group.
pub(crate) const ROW_KEYS: [&str; 2] = ["rows", "tiers"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Whether a row object is the group's current tier.
pub(crate) fn is_current_row(row: &serde_json::Map<String, Value>) -> bool {
    ["is_current", "Current"]
        .iter()
        .any(|k| row.get(*k).and_then(Value::as_bool).unwrap_or(false))
}

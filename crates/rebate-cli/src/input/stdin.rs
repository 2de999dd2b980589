use std::io::{self, Read};

use rebate_core::ingest::RawRow;

use super::table_file::rows_from_value;

/// Read summary rows as JSON from stdin if data is being piped.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin_rows() -> Result<Option<Vec<RawRow>>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let rows = rows_from_value(serde_json::from_str(trimmed)?)?;
    Ok(Some(rows))
}

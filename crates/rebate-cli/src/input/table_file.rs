use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;

use rebate_core::ingest::RawRow;

use super::file::resolve_path;

/// Read summary rows from a CSV file (every cell as text) or a JSON file
/// holding one object or an array of objects.
pub fn read_rows(path: &str) -> Result<Vec<RawRow>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let is_csv = canonical
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        let mut rdr = csv::Reader::from_path(&canonical)
            .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;
        let headers = rdr.headers()?.clone();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let row: RawRow = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
                .collect();
            rows.push(row);
        }
        return Ok(rows);
    }

    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    rows_from_value(value)
}

/// Accept a single row object or an array of row objects.
pub fn rows_from_value(value: Value) -> Result<Vec<RawRow>, Box<dyn std::error::Error>> {
    match value {
        Value::Array(items) => {
            let mut rows = Vec::with_capacity(items.len());
            for item in items {
                rows.push(serde_json::from_value::<RawRow>(item)?);
            }
            Ok(rows)
        }
        Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        _ => Err("Expected a JSON object or an array of objects".into()),
    }
}

/// Deserialise every record of a CSV file by header name. Extra columns are
/// ignored.
pub fn read_csv<T: DeserializeOwned>(path: &str) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let mut rdr = csv::Reader::from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;
    let mut out = Vec::new();
    for (idx, record) in rdr.deserialize().enumerate() {
        let record: T = record
            .map_err(|e| format!("Row {} of '{}': {}", idx + 2, canonical.display(), e))?;
        out.push(record);
    }
    Ok(out)
}

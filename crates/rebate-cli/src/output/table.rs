use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{is_current_row, ROW_KEYS};

/// Format output as tables using the tabled crate. Per-tier rows get their
/// own table with the current tier highlighted.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Array(arr)) => {
                print_array_table(arr);
                print_envelope_notes(map);
            }
            Some(result) => {
                print_result_table(result);
                print_envelope_notes(map);
            }
            None => print_result_table(value),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value) {
    let Value::Object(res_map) = result else {
        println!("{}", format_value(result));
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut nested: Vec<(&str, &Vec<Value>)> = Vec::new();
    for (key, val) in res_map {
        match val {
            Value::Array(arr) if ROW_KEYS.contains(&key.as_str()) => nested.push((key.as_str(), arr)),
            Value::Object(inner) => {
                for (k, v) in inner {
                    builder.push_record([format!("{}.{}", key, k), format_value(v)]);
                }
            }
            _ => builder.push_record([key.clone(), format_value(val)]),
        }
    }
    println!("{}", Table::from(builder));

    for (key, arr) in nested {
        println!("\n{}:", key);
        print_array_table(arr);
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow().bold());
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Headers come from the first object
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());

    for item in arr {
        let Value::Object(map) = item else { continue };
        let current = is_current_row(map);
        let row: Vec<String> = headers
            .iter()
            .map(|h| {
                let cell = map.get(h.as_str()).map(format_value).unwrap_or_default();
                if current {
                    cell.green().bold().to_string()
                } else {
                    cell
                }
            })
            .collect();
        builder.push_record(row);
    }

    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

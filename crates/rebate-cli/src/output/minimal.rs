use serde_json::Value;

use super::{is_current_row, ROW_KEYS};

/// Print just the key answer from the output.
///
/// For a rebate table this is the current tier and its annual rebate; for
/// other results the first well-known field, then the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result_obj else {
        if let Value::Array(arr) = result_obj {
            println!("{} rows", arr.len());
        } else {
            println!("{}", format_minimal(result_obj));
        }
        return;
    };

    if let Some(Value::String(headline)) = map.get("headline") {
        println!("{}", headline);
        return;
    }

    if map.contains_key("current_tier") {
        let tier = map
            .get("current_tier")
            .and_then(Value::as_str)
            .unwrap_or("N/A");
        let annual = map
            .get("current_rebate_annual")
            .map(format_minimal)
            .unwrap_or_default();
        println!("{}: {}", tier, annual);
        return;
    }

    if let Some(current) = ROW_KEYS
        .iter()
        .filter_map(|k| map.get(*k).and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_object)
        .find(|row| is_current_row(row))
    {
        println!("{}", serde_json::to_string(current).unwrap_or_default());
        return;
    }

    if let Some((key, val)) = map.iter().next() {
        println!("{}: {}", key, format_minimal(val));
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

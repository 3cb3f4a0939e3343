use serde_json::Value;

/// Priority list of key output fields, most telling first.
const PRIORITY_KEYS: [&str; 6] = [
    "Equity IRR",
    "irr_pct",
    "irr",
    "payment",
    "levered_irr",
    "files",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority (also inside a
/// nested `kpis` object), then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        let kpis = map.get("kpis").and_then(Value::as_object);
        for key in &PRIORITY_KEYS {
            let found = map.get(*key).or_else(|| kpis.and_then(|k| k.get(*key)));
            if let Some(val) = found {
                println!("{}", format_minimal(val));
                return;
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    if let Value::Array(rows) = result_obj {
        println!("{} rows", rows.len());
        return;
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "n/a".to_string(),
        Value::Array(items) => items
            .iter()
            .map(format_minimal)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar fields of the result (nested objects flattened to `a.b` keys)
/// go into one Field/Value table; every array of rows gets its own table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_object(res_map),
        Value::Array(rows) => print_array_table(rows),
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut fields = Vec::new();
    let mut sections = Vec::new();
    flatten("", map, &mut fields, &mut sections);

    if !fields.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in fields {
            builder.push_record([key, val]);
        }
        println!("{}", Table::from(builder));
    }

    for (name, rows) in sections {
        println!("\n{}:", name);
        print_array_table(rows);
    }
}

/// Split `map` into scalar fields and arrays of objects, keeping order.
fn flatten<'a>(
    prefix: &str,
    map: &'a Map<String, Value>,
    fields: &mut Vec<(String, String)>,
    sections: &mut Vec<(String, &'a [Value])>,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, fields, sections),
            Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
                sections.push((name, rows.as_slice()));
            }
            other => fields.push((name, format_value(other))),
        }
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "n/a".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_separates_row_arrays() {
        let value = json!({
            "kpis": {"capex": "100000", "levered_irr": null},
            "projection": [{"Year": 0}, {"Year": 1}],
            "files": ["a.csv"],
        });
        let mut fields = Vec::new();
        let mut sections = Vec::new();
        flatten("", value.as_object().unwrap(), &mut fields, &mut sections);

        assert_eq!(
            fields,
            vec![
                ("kpis.capex".to_string(), "100000".to_string()),
                ("kpis.levered_irr".to_string(), "n/a".to_string()),
                ("files".to_string(), "a.csv".to_string()),
            ]
        );
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].0, "projection");
        assert_eq!(sections[0].1.len(), 2);
    }
}

use serde_json::{Map, Value};
use std::io::{self, Write};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(value, stdout.lock()) {
        log::error!("CSV output failed: {e}");
    }
}

/// Arrays of rows become a table with a header taken from the first row;
/// objects become two-column `field,value` records with nested keys
/// flattened to `a.b`.
pub fn write_csv<W: Write>(value: &Value, writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Array(rows)) => write_array_csv(&mut wtr, rows)?,
            Some(Value::Object(result)) => write_fields_csv(&mut wtr, result)?,
            _ => write_fields_csv(&mut wtr, map)?,
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr)?,
        _ => wtr.write_record([&format_csv_value(value)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_fields_csv<W: Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    let mut fields = Vec::new();
    collect_fields("", map, &mut fields);
    for (key, val) in fields {
        wtr.write_record([key.as_str(), val.as_str()])?;
    }
    Ok(())
}

fn collect_fields(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => collect_fields(&name, inner, out),
            other => out.push((name, format_csv_value(other))),
        }
    }
}

fn write_array_csv<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    if arr.is_empty() {
        return Ok(());
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        wtr.write_record(&headers)?;

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                wtr.write_record(&row)?;
            }
        }
    } else {
        for item in arr {
            wtr.write_record([&format_csv_value(item)])?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut buf = Vec::new();
        write_csv(value, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_rows_keep_field_order_and_blank_nulls() {
        let value = json!([
            {"Year": 0, "EBITDA": "0", "DSCR": null},
            {"Year": 1, "EBITDA": "13647", "DSCR": "2.02"},
        ]);
        assert_eq!(render(&value), "Year,EBITDA,DSCR\n0,0,\n1,13647,2.02\n");
    }

    #[test]
    fn test_nested_result_flattened() {
        let value = json!({"result": {"kpis": {"capex": "100000"}, "objects": 2}});
        assert_eq!(render(&value), "field,value\nkpis.capex,100000\nobjects,2\n");
    }
}

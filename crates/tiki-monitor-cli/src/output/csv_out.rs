use serde_json::{Map, Value};
use std::io::{self, Write};

use crate::output::{plain, result_of};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write the result as CSV to stdout. Scalar fields come first as
/// `field,value`; each list follows as its own block, introduced by its
/// name and separated by a blank line.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    match result_of(value) {
        Value::Object(map) => write_object(&mut wtr, map),
        Value::Array(arr) => write_rows(&mut wtr, arr),
        other => {
            let _ = wtr.write_record([plain(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_object(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let scalars: Vec<(&String, &Value)> = map
        .iter()
        .filter(|(_, v)| !v.is_array() && !v.is_object())
        .collect();
    let mut wrote = false;
    if !scalars.is_empty() {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in scalars {
            let _ = wtr.write_record([key.as_str(), &plain(val)]);
        }
        wrote = true;
    }

    for (key, val) in map {
        let rows: Vec<Value> = match val {
            Value::Array(arr) => arr.clone(),
            Value::Object(_) => vec![val.clone()],
            _ => continue,
        };
        if wrote {
            blank_line(wtr);
        }
        let _ = wtr.write_record([key.as_str()]);
        write_rows(wtr, &rows);
        wrote = true;
    }
}

fn blank_line(wtr: &mut StdoutWriter<'_>) {
    let _ = wtr.flush();
    let _ = io::stdout().write_all(b"\n");
}

fn write_rows(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(plain).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([plain(item)]);
        }
    }
}

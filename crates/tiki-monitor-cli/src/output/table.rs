use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use crate::output::{plain, result_of};

/// Format output as tables: one for the scalar fields, then one per
/// nested section.
pub fn print_table(value: &Value) {
    match result_of(value) {
        Value::Object(map) => print_section(None, map),
        Value::Array(arr) => print_array_table("result", arr),
        other => println!("{}", plain(other)),
    }

    let Some(envelope) = value.as_object() else {
        return;
    };

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

fn print_section(title: Option<&str>, map: &Map<String, Value>) {
    let scalars: Vec<(&String, &Value)> = map
        .iter()
        .filter(|(_, v)| !v.is_array() && !v.is_object())
        .collect();

    if !scalars.is_empty() {
        if let Some(t) = title {
            println!("\n{}", t);
        }
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in scalars {
            builder.push_record([key.as_str(), &plain(val)]);
        }
        println!("{}", Table::from(builder));
    }

    for (key, val) in map {
        match val {
            Value::Object(inner) => print_section(Some(key), inner),
            Value::Array(arr) => print_array_table(key, arr),
            _ => {}
        }
    }
}

fn print_array_table(title: &str, arr: &[Value]) {
    println!("\n{}", title);
    if arr.is_empty() {
        println!("(no data)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(plain).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("  {}", plain(item));
        }
    }
}

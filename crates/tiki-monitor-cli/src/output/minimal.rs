use serde_json::Value;

use crate::output::{plain, result_of};

/// Print just the headline value from the output.
///
/// Looks through the result (and its `kpis` block, when present) for
/// well-known fields in priority order, then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = result_of(value);
    let scope = result_obj
        .as_object()
        .and_then(|m| m.get("kpis"))
        .unwrap_or(result_obj);

    let priority_keys = [
        "total_revenue",
        "hhi",
        "nps",
        "products",
        "rows",
        "categories",
    ];

    if let Value::Object(map) = scope {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", plain(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, plain(val));
            return;
        }
    }

    println!("{}", plain(scope));
}

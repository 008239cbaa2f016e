pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Row-shaped data inside a result: schedule flows or sweep points.
pub(crate) fn find_rows(result: &Value) -> Option<&Vec<Value>> {
    let paths: [&[&str]; 3] = [&["flows"], &["schedule", "flows"], &["results"]];
    paths.iter().find_map(|path| {
        let mut node = result;
        for key in *path {
            node = node.get(*key)?;
        }
        node.as_array()
    })
}

/// Scalar fields of a result, with nested objects flattened as `parent.child`
/// and arrays left out.
pub(crate) fn scalar_fields(result: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut fields = Vec::new();
    collect_scalars("", result, &mut fields);
    fields
}

fn collect_scalars(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => collect_scalars(&name, inner, out),
            Value::Array(_) => {}
            _ => out.push((name, val.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_rows_in_nested_schedule() {
        let result = json!({ "schedule": { "flows": [{ "period": 1 }] }, "metrics": {} });
        assert_eq!(find_rows(&result).map(|r| r.len()), Some(1));
    }

    #[test]
    fn test_scalar_fields_flatten_nested_objects() {
        let result = json!({ "metrics": { "ytm": "0.05" }, "schedule": { "periods": 20, "flows": [] } });
        let names: Vec<String> = scalar_fields(result.as_object().unwrap())
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(names, vec!["metrics.ytm", "schedule.periods"]);
    }
}

// src/core/canonical.rs

//! Deterministic JSON serialization.
//!
//! Everything the engine hashes goes through [`to_canonical_json`] first:
//! object keys sorted lexicographically, no insignificant whitespace, numbers
//! in serde_json's shortest round-tripping decimal form, strings with
//! standard JSON escaping, arrays in given order. The writer walks the value
//! explicitly rather than relying on map iteration order, so the output does
//! not change if a dependency enables `preserve_order` on `serde_json`.

use serde_json::Value;

use crate::error::{JournalError, Result};

/// Serializes a JSON value into its canonical form.
///
/// The engine never hashes ad-hoc string concatenations; every hashed
/// structure is rendered through this function.
pub fn to_canonical_json(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => {
            // serde_json rejects NaN/infinity at construction, so Display
            // here is always a valid shortest-form decimal.
            out.push_str(&n.to_string());
        }
        Value::String(s) => {
            let escaped = serde_json::to_string(s)
                .map_err(|e| JournalError::Canonicalization(e.to_string()))?;
            out.push_str(&escaped);
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, val)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let escaped_key = serde_json::to_string(key)
                    .map_err(|e| JournalError::Canonicalization(e.to_string()))?;
                out.push_str(&escaped_key);
                out.push(':');
                write_value(out, val)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_object_keys() {
        let v = json!({"zeta": 1, "alpha": {"c": 3, "b": 2}});
        assert_eq!(
            to_canonical_json(&v).unwrap(),
            r#"{"alpha":{"b":2,"c":3},"zeta":1}"#
        );
    }

    #[test]
    fn preserves_array_order() {
        let v = json!([3, 1, 2]);
        assert_eq!(to_canonical_json(&v).unwrap(), "[3,1,2]");
    }

    #[test]
    fn no_insignificant_whitespace() {
        let v = json!({"a": [true, false, null], "b": "x y"});
        assert_eq!(
            to_canonical_json(&v).unwrap(),
            r#"{"a":[true,false,null],"b":"x y"}"#
        );
    }

    #[test]
    fn escapes_strings() {
        let v = json!({"k": "line\nbreak \"quoted\""});
        assert_eq!(
            to_canonical_json(&v).unwrap(),
            r#"{"k":"line\nbreak \"quoted\""}"#
        );
    }

    #[test]
    fn shortest_number_form() {
        let v = json!({"f": 1.5, "i": 10, "neg": -0.25});
        assert_eq!(
            to_canonical_json(&v).unwrap(),
            r#"{"f":1.5,"i":10,"neg":-0.25}"#
        );
    }
}

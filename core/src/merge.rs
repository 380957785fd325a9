//! Deep merge over plain JSON objects.

use serde_json::Value;

use crate::{Error, Result};

/// Recursively merges `source` into `target`.
///
/// Nested objects are merged key by key; any other value in `source`
/// overwrites the one in `target`.
///
/// # Errors
///
/// [`Error::MergeNonObject`] if either side is not an object, or if an array
/// is met anywhere on either side of a merged key. `target` may already be
/// partially updated when this happens.
pub fn deep_merge(target: &mut Value, source: Value) -> Result<()> {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, incoming) in source {
                if incoming.is_array() {
                    return Err(Error::MergeNonObject { found: "array" });
                }
                let slot = target.entry(key).or_insert(Value::Null);
                if slot.is_array() {
                    return Err(Error::MergeNonObject { found: "array" });
                }
                if slot.is_object() && incoming.is_object() {
                    deep_merge(slot, incoming)?;
                } else {
                    *slot = incoming;
                }
            }
            Ok(())
        }
        (Value::Object(_), source) => Err(Error::MergeNonObject {
            found: kind(&source),
        }),
        (target, _) => Err(Error::MergeNonObject {
            found: kind(target),
        }),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn nested_objects_merge_key_by_key() {
        let mut target = json!({ "font": { "size": 12, "weight": "bold" }, "color": "red" });
        deep_merge(&mut target, json!({ "font": { "size": 14 }, "margin": 0 })).unwrap();
        assert_eq!(
            target,
            json!({ "font": { "size": 14, "weight": "bold" }, "color": "red", "margin": 0 })
        );
    }

    #[test]
    fn arrays_are_rejected() {
        let mut target = json!({ "a": 1 });
        assert_eq!(
            deep_merge(&mut target, json!({ "a": [1, 2] })),
            Err(Error::MergeNonObject { found: "array" })
        );
        let mut target = json!({ "a": [1] });
        assert!(deep_merge(&mut target, json!({ "a": 2 })).is_err());
        let mut target = json!([1]);
        assert_eq!(
            deep_merge(&mut target, json!({})),
            Err(Error::MergeNonObject { found: "array" })
        );
    }
}

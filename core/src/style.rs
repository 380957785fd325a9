//! Inline style serialisation.

use core::fmt::Write;

use serde_json::{Map, Value};

/// Renders a flat style map as a `cssText` string.
///
/// Keys are written as given, so use CSS property names (`font-size`).
/// Numbers are written bare, `null` entries are skipped, and nested values
/// are not representable in an inline style and are skipped as well.
#[must_use]
pub fn css_text(style: &Map<String, Value>) -> String {
    let mut out = String::new();
    for (name, value) in style {
        let rendered = match value {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => continue,
        };
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{name}: {rendered};");
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_scalars_in_key_order() {
        let Value::Object(style) = json!({ "color": "red", "opacity": 0.5, "skip": null }) else {
            unreachable!()
        };
        assert_eq!(css_text(&style), "color: red; opacity: 0.5;");
        assert_eq!(css_text(&Map::new()), "");
    }
}

use serde_json::{Map, Value};

/// Renders a value as pretty JSON for tool output. Non-ASCII text is kept
/// as-is.
pub fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Textual form of a JSON string or number. `null` yields `None`; any other
/// type is rejected with its type name. Upstream payloads are inconsistent
/// about identifiers and labels.
pub fn scalar_text(value: &Value) -> Result<Option<String>, &'static str> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(json_type_name(other)),
    }
}

/// Removes every key in `keys` from `fields` and returns the first value
/// that is a non-blank string or a number. Keys are listed by priority.
pub fn take_first_text(
    fields: &mut Map<String, Value>,
    keys: &[&str],
) -> Result<Option<String>, String> {
    let mut chosen = None;
    for key in keys {
        let Some(value) = fields.remove(*key) else {
            continue;
        };
        let text = scalar_text(&value)
            .map_err(|found| format!("{key} must be a string or number, found {found}"))?;
        if chosen.is_none() {
            chosen = text.filter(|text| !text.trim().is_empty());
        }
    }
    Ok(chosen)
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

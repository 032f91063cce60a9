use rule_query_core::serde_utils::json_type_name;
use serde_json::{Map, Value};

use crate::error::RuleError;
use crate::rule::Rule;

/// Decodes the body returned by the purpose lookup service.
///
/// Accepted shapes: a list of rule objects, `{"rules": [...]}`, or an object
/// keyed by rule identifier. List entries and keyed values may also be plain
/// strings, which become the rule description.
pub fn decode_rules(payload: &Value) -> Result<Vec<Rule>, RuleError> {
    match payload {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| decode_entry(item, || (index + 1).to_string()))
            .collect(),
        Value::Object(map) => match map.get("rules") {
            Some(rules @ Value::Array(_)) => decode_rules(rules),
            _ => decode_keyed(map),
        },
        other => Err(RuleError::UnexpectedShape {
            found: json_type_name(other),
        }),
    }
}

fn decode_keyed(map: &Map<String, Value>) -> Result<Vec<Rule>, RuleError> {
    map.iter()
        .map(|(key, value)| decode_entry(value, || key.clone()))
        .collect()
}

fn decode_entry<F>(item: &Value, fallback_id: F) -> Result<Rule, RuleError>
where
    F: FnOnce() -> String,
{
    let mut rule = match item {
        Value::Object(_) => serde_json::from_value::<Rule>(item.clone()).map_err(|err| {
            RuleError::InvalidRule {
                id: fallback_id_hint(item),
                message: err.to_string(),
            }
        })?,
        Value::String(text) => Rule::default().with_description(text.clone()),
        other => {
            return Err(RuleError::InvalidRule {
                id: "<unnamed>".to_string(),
                message: format!("expected object or string, found {}", json_type_name(other)),
            })
        }
    };

    if rule.id.trim().is_empty() {
        rule.id = fallback_id();
    }

    Ok(rule)
}

fn fallback_id_hint(item: &Value) -> String {
    item.get("id")
        .or_else(|| item.get("rule_id"))
        .map(|value| value.to_string())
        .unwrap_or_else(|| "<unnamed>".to_string())
}

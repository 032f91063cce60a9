use rule_query_core::serde_utils::{json_type_name, take_first_text};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ID_KEYS: &[&str] = &["id", "rule_id"];
const DESCRIPTION_KEYS: &[&str] = &["description", "rule", "content"];
const STATUS_KEYS: &[&str] = &["required_status", "order_status", "status"];

/// Business rule returned by the purpose lookup service.
///
/// Field names vary between deployments. When several spellings of the same
/// field are present, the first non-blank one in priority order is used and
/// the others are discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(try_from = "Map<String, Value>")]
pub struct Rule {
    /// Identifier reported by the rules service. Empty when absent or null.
    pub id: String,
    /// Human readable rule text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Purpose the rule was registered for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Additional purpose tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Order status the rule requires. Absent means any status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Remaining fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for Rule {
    type Error = String;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = take_first_text(&mut fields, ID_KEYS)?.unwrap_or_default();
        let description = take_first_text(&mut fields, DESCRIPTION_KEYS)?;
        let purpose = take_first_text(&mut fields, &["purpose"])?;
        let status = take_first_text(&mut fields, STATUS_KEYS)?;
        let tags = match fields.remove("tags") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(tag) => Ok(tag),
                    other => Err(format!("tags must be strings, found {}", json_type_name(&other))),
                })
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(format!("tags must be a list, found {}", json_type_name(&other)))
            }
        };

        Ok(Self {
            id,
            description,
            purpose,
            tags,
            status,
            extra: fields,
        })
    }
}

impl Rule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Required status, ignoring blank values.
    pub fn required_status(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|status| !status.is_empty())
    }

    /// Declared purpose, ignoring blank values.
    pub fn declared_purpose(&self) -> Option<&str> {
        self.purpose
            .as_deref()
            .map(str::trim)
            .filter(|purpose| !purpose.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_field_aliases_and_keeps_extras() {
        let rule: Rule = serde_json::from_value(json!({
            "rule_id": 7,
            "rule": "配送时间只能修改一次",
            "required_status": "处理中",
            "channel": "app"
        }))
        .unwrap();

        assert_eq!(rule.id, "7");
        assert_eq!(rule.description.as_deref(), Some("配送时间只能修改一次"));
        assert_eq!(rule.required_status(), Some("处理中"));
        assert_eq!(rule.extra.get("channel"), Some(&json!("app")));
    }

    #[test]
    fn conflicting_status_spellings_use_priority() {
        let rule: Rule = serde_json::from_value(json!({
            "id": "R1",
            "status": "active",
            "required_status": "处理中"
        }))
        .unwrap();
        assert_eq!(rule.required_status(), Some("处理中"));
        assert!(rule.extra.is_empty());

        let rule: Rule = serde_json::from_value(json!({
            "rule_id": "R2",
            "required_status": "",
            "order_status": "已发货"
        }))
        .unwrap();
        assert_eq!(rule.required_status(), Some("已发货"));
    }

    #[test]
    fn null_id_is_treated_as_absent() {
        let rule: Rule = serde_json::from_value(json!({"id": null, "rule": "只能修改一次"})).unwrap();
        assert_eq!(rule.id, "");
        assert_eq!(rule.description.as_deref(), Some("只能修改一次"));
    }

    #[test]
    fn blank_status_is_not_a_requirement() {
        let rule = Rule::new("r1").with_status("  ");
        assert_eq!(rule.required_status(), None);
    }
}

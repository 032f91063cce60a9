use rule_query_core::serde_utils::take_first_text;
use serde::Serialize;
use serde_json::{Map, Value};

/// Keys that may carry the status label, highest priority first.
const STATUS_KEYS: &[&str] = &["order_status", "status", "state"];

/// Order status as reported by the order service. The decoded object is
/// kept verbatim in `details`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderStatus {
    pub order_id: Option<String>,
    pub status: Option<String>,
    pub details: Map<String, Value>,
}

impl OrderStatus {
    /// Decodes an order status body. Returns `None` when the payload is not
    /// an object or carries no usable status label.
    pub fn from_body(order_id: &str, body: &Value) -> Option<Self> {
        let candidate = match body.get("data") {
            Some(inner @ Value::Object(_)) => inner,
            _ => body,
        };
        let details = candidate.as_object()?.clone();

        let mut fields = details.clone();
        let status = take_first_text(&mut fields, STATUS_KEYS)
            .ok()
            .flatten()
            .map(|label| label.trim().to_string())?;
        let reported_id = take_first_text(&mut fields, &["order_id"]).ok().flatten();

        Some(Self {
            order_id: Some(reported_id.unwrap_or_else(|| order_id.to_string())),
            status: Some(status),
            details,
        })
    }

    pub fn label(&self) -> &str {
        self.status.as_deref().unwrap_or_default()
    }
}

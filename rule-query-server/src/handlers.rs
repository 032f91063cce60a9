use rule_query_core::serde_utils::{json_type_name, to_pretty_json};
use rule_query_core::ErrorKind;
use rule_query_engine::{RuleQueryWorkflow, WorkflowError};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::protocol::ToolCallResult;
use crate::tools::{FETCH_MATCHED_RULES, FETCH_ORDER_STATUS, RULE_QUERY_WORKFLOW};

/// Failure of a single tool invocation, before it is rendered for the caller.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing required argument {0}")]
    MissingArgument(&'static str),
    #[error("argument {field} must be a string, found {found}")]
    NotAString {
        field: &'static str,
        found: &'static str,
    },
    #[error("arguments must be an object, found {0}")]
    ArgumentsNotObject(&'static str),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("failed to format result: {0}")]
    Format(#[from] serde_json::Error),
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::MissingArgument(_)
            | ToolError::NotAString { .. }
            | ToolError::ArgumentsNotObject(_)
            | ToolError::UnknownTool(_) => ErrorKind::InvalidArgument,
            ToolError::Workflow(err) => err.kind(),
            ToolError::Format(_) => ErrorKind::InternalError,
        }
    }

    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ToolError::Workflow(err) => err.upstream_status(),
            _ => None,
        }
    }
}

/// Structured error payload returned to tool callers.
#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub success: bool,
    pub error: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl From<&ToolError> for ErrorPayload {
    fn from(err: &ToolError) -> Self {
        Self {
            success: false,
            error: err.kind(),
            message: err.to_string(),
            upstream_status: err.upstream_status(),
        }
    }
}

/// Dispatches tool calls to the workflow and renders their outcome.
#[derive(Clone)]
pub struct ToolHandlers {
    workflow: RuleQueryWorkflow,
}

impl ToolHandlers {
    pub fn new(workflow: RuleQueryWorkflow) -> Self {
        Self { workflow }
    }

    /// Invokes tool `name`. Never fails: errors become an `isError` result
    /// carrying an [`ErrorPayload`].
    pub async fn handle(&self, name: &str, arguments: Value) -> ToolCallResult {
        info!(tool = name, arguments = %arguments, "tool invoked");

        match self.dispatch(name, &arguments).await {
            Ok(text) => {
                info!(tool = name, "tool succeeded");
                ToolCallResult::text(text, false)
            }
            Err(err) => {
                error!(
                    tool = name,
                    arguments = %arguments,
                    kind = %err.kind(),
                    upstream_status = ?err.upstream_status(),
                    error = %err,
                    "tool failed"
                );
                ToolCallResult::text(render_error(&err), true)
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: &Value) -> Result<String, ToolError> {
        let arguments = as_object(arguments)?;
        match name {
            RULE_QUERY_WORKFLOW => {
                let order_id = string_arg(&arguments, "order_id")?;
                let purpose = string_arg(&arguments, "purpose")?;
                let result = self.workflow.run(order_id, purpose).await?;
                Ok(to_pretty_json(&result)?)
            }
            FETCH_ORDER_STATUS => {
                let order_id = string_arg(&arguments, "order_id")?;
                let report = self.workflow.fetch_order_status(order_id).await?;
                Ok(to_pretty_json(&report)?)
            }
            FETCH_MATCHED_RULES => {
                let purpose = string_arg(&arguments, "purpose")?;
                let rules = self.workflow.fetch_matched_rules(purpose).await?;
                Ok(to_pretty_json(&rules)?)
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

fn as_object(arguments: &Value) -> Result<Map<String, Value>, ToolError> {
    match arguments {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(ToolError::ArgumentsNotObject(json_type_name(other))),
    }
}

fn string_arg<'a>(
    arguments: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ToolError> {
    match arguments.get(field) {
        None | Some(Value::Null) => Err(ToolError::MissingArgument(field)),
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(other) => Err(ToolError::NotAString {
            field,
            found: json_type_name(other),
        }),
    }
}

fn render_error(err: &ToolError) -> String {
    let payload = ErrorPayload::from(err);
    to_pretty_json(&payload).unwrap_or_else(|_| {
        format!(
            "{{\"success\": false, \"error\": \"{}\", \"message\": {:?}}}",
            payload.error, payload.message
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_arguments_are_validated() {
        let args = as_object(&json!({"order_id": 42, "purpose": "取消订单"})).unwrap();
        assert!(matches!(
            string_arg(&args, "order_id"),
            Err(ToolError::NotAString { field: "order_id", found: "number" })
        ));
        assert!(matches!(
            string_arg(&args, "missing"),
            Err(ToolError::MissingArgument("missing"))
        ));
        assert_eq!(string_arg(&args, "purpose").unwrap(), "取消订单");
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        assert!(matches!(
            as_object(&json!(["ST-9012"])),
            Err(ToolError::ArgumentsNotObject("array"))
        ));
        assert!(as_object(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn error_payload_carries_kind_and_message() {
        let err = ToolError::from(WorkflowError::OrderNotFound {
            order_id: "nonexistent".into(),
            status: Some(404),
        });
        let rendered: Value = serde_json::from_str(&render_error(&err)).unwrap();
        assert_eq!(rendered["success"], json!(false));
        assert_eq!(rendered["error"], json!("OrderNotFound"));
        assert_eq!(rendered["upstream_status"], json!(404));
    }

    #[test]
    fn format_failures_are_internal_errors() {
        let source = serde_json::from_str::<Value>("{").unwrap_err();
        let err = ToolError::from(source);
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert_eq!(err.upstream_status(), None);
    }
}

use rule_query_core::ErrorKind;
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Errors that may occur while running the rule query workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{field} must be a non-empty string")]
    InvalidArgument { field: &'static str },
    #[error("order {order_id} does not exist{}", .status.map(|code| format!(" (upstream status {code})")).unwrap_or_default())]
    OrderNotFound {
        order_id: String,
        status: Option<u16>,
    },
    #[error("{operation} failed: {source}")]
    Upstream {
        operation: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl WorkflowError {
    pub fn upstream(operation: &'static str, source: UpstreamError) -> Self {
        WorkflowError::Upstream { operation, source }
    }

    /// Category reported to tool callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            WorkflowError::OrderNotFound { .. } => ErrorKind::OrderNotFound,
            WorkflowError::Upstream { .. } => ErrorKind::UpstreamError,
        }
    }

    /// Upstream HTTP status involved in the failure, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            WorkflowError::OrderNotFound { status, .. } => *status,
            WorkflowError::Upstream { source, .. } => source.status_code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_mentions_status() {
        let err = WorkflowError::OrderNotFound {
            order_id: "nonexistent".into(),
            status: Some(404),
        };
        assert_eq!(err.kind(), ErrorKind::OrderNotFound);
        assert_eq!(
            err.to_string(),
            "order nonexistent does not exist (upstream status 404)"
        );
        assert_eq!(err.upstream_status(), Some(404));
    }
}

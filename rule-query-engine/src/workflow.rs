use rule_query_core::UpstreamConfig;
use rule_query_rules::{decode_rules, filter_rules, Rule};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::WorkflowError;
use crate::order::OrderStatus;
use crate::upstream::{UpstreamClient, UpstreamError};

/// Successful answer of the rule query workflow.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryResult {
    pub success: bool,
    pub order_id: String,
    pub purpose: String,
    pub order_status: String,
    pub order: OrderStatus,
    pub rules: Vec<Rule>,
}

/// Raw view of the order status lookup, as exposed by the
/// `fetch_order_status` tool.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderStatusReport {
    pub status_code: u16,
    pub body: Value,
}

/// Rules registered for a purpose, unfiltered.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchedRules {
    pub purpose: String,
    pub rules: Vec<Rule>,
}

/// Orchestrates the order status lookup, rule lookup and filter.
///
/// Steps run strictly in sequence and the rules endpoint is only called once
/// the order is known to exist.
#[derive(Clone)]
pub struct RuleQueryWorkflow {
    client: UpstreamClient,
}

impl RuleQueryWorkflow {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        UpstreamClient::new(config).map(Self::new)
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    /// Runs the full workflow for `order_id` and `purpose`.
    pub async fn run(&self, order_id: &str, purpose: &str) -> Result<QueryResult, WorkflowError> {
        let order_id = require_non_empty("order_id", order_id)?;
        let purpose = require_non_empty("purpose", purpose)?;

        info!(order_id, purpose, "rule query workflow started");

        let order = self.resolve_order(order_id).await?;
        let rules = self.load_rules(purpose).await?;
        let matched = filter_rules(&rules, purpose, order.label());

        info!(
            order_id,
            purpose,
            order_status = order.label(),
            fetched = rules.len(),
            matched = matched.len(),
            "rule query workflow finished"
        );

        Ok(QueryResult {
            success: true,
            order_id: order_id.to_string(),
            purpose: purpose.to_string(),
            order_status: order.label().to_string(),
            order,
            rules: matched,
        })
    }

    /// Reports the order service's answer verbatim. A non-2xx status is part
    /// of the report rather than an error.
    pub async fn fetch_order_status(
        &self,
        order_id: &str,
    ) -> Result<OrderStatusReport, WorkflowError> {
        let order_id = require_non_empty("order_id", order_id)?;
        let response = self
            .client
            .order_status(order_id)
            .await
            .map_err(|err| WorkflowError::upstream("fetch_order_status", err))?;

        info!(order_id, status = response.status.as_u16(), "order status fetched");

        Ok(OrderStatusReport {
            status_code: response.status.as_u16(),
            body: response.body.unwrap_or_else(|| json!({})),
        })
    }

    /// Returns every rule registered for `purpose` without filtering.
    pub async fn fetch_matched_rules(&self, purpose: &str) -> Result<MatchedRules, WorkflowError> {
        let purpose = require_non_empty("purpose", purpose)?;
        let rules = self.load_rules(purpose).await?;
        Ok(MatchedRules {
            purpose: purpose.to_string(),
            rules,
        })
    }

    async fn resolve_order(&self, order_id: &str) -> Result<OrderStatus, WorkflowError> {
        let response = self
            .client
            .order_status(order_id)
            .await
            .map_err(|err| WorkflowError::upstream("fetch_order_status", err))?;

        let status_code = response.status.as_u16();
        if !response.is_success() {
            warn!(order_id, status = status_code, "order status lookup reported no order");
            return Err(WorkflowError::OrderNotFound {
                order_id: order_id.to_string(),
                status: Some(status_code),
            });
        }

        let body = match response.body {
            Some(body) => body,
            None => {
                warn!(order_id, status = status_code, "order status lookup returned empty body");
                return Err(WorkflowError::OrderNotFound {
                    order_id: order_id.to_string(),
                    status: Some(status_code),
                });
            }
        };

        OrderStatus::from_body(order_id, &body).ok_or_else(|| {
            warn!(order_id, status = status_code, "order status payload has no status label");
            WorkflowError::upstream(
                "fetch_order_status",
                UpstreamError::Decode {
                    url: self.client.order_status_url().to_string(),
                    message: "payload carries no order status".to_string(),
                },
            )
        })
    }

    async fn load_rules(&self, purpose: &str) -> Result<Vec<Rule>, WorkflowError> {
        let url = self.client.purpose_url().to_string();
        let response = self
            .client
            .matched_rules(purpose)
            .await
            .map_err(|err| WorkflowError::upstream("fetch_matched_rules", err))?;

        if !response.is_success() {
            warn!(purpose, status = response.status.as_u16(), "rules lookup failed");
            return Err(WorkflowError::upstream(
                "fetch_matched_rules",
                UpstreamError::UnexpectedStatus {
                    url,
                    status: response.status,
                },
            ));
        }

        let body = response.body.ok_or_else(|| {
            warn!(purpose, "rules lookup returned empty body");
            WorkflowError::upstream(
                "fetch_matched_rules",
                UpstreamError::EmptyBody { url: url.clone() },
            )
        })?;

        let rules = decode_rules(&body).map_err(|err| {
            warn!(purpose, error = %err, "rules payload could not be decoded");
            WorkflowError::upstream(
                "fetch_matched_rules",
                UpstreamError::Decode {
                    url: url.clone(),
                    message: err.to_string(),
                },
            )
        })?;

        info!(purpose, count = rules.len(), "rules fetched");
        Ok(rules)
    }
}

/// Rejects values that are empty or whitespace only. Accepted values are
/// returned unchanged.
pub fn require_non_empty<'a>(
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, WorkflowError> {
    if value.trim().is_empty() {
        Err(WorkflowError::InvalidArgument { field })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_invalid() {
        assert!(matches!(
            require_non_empty("order_id", "   "),
            Err(WorkflowError::InvalidArgument { field: "order_id" })
        ));
        assert_eq!(require_non_empty("purpose", "取消订单").unwrap(), "取消订单");
    }
}

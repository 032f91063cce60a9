//! MCP tool front end for the rule query workflow.
//!
//! Exposes `rule_query_workflow`, `fetch_order_status` and
//! `fetch_matched_rules` as tools over newline-delimited JSON-RPC on stdio.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;

use anyhow::Context;
use rule_query_core::UpstreamConfig;
use rule_query_engine::RuleQueryWorkflow;

pub use handlers::{ErrorPayload, ToolError, ToolHandlers};
pub use server::McpServer;

/// Builds a server wired to the configured upstream endpoints.
pub fn build_server(config: &UpstreamConfig) -> anyhow::Result<McpServer> {
    let workflow =
        RuleQueryWorkflow::from_config(config).context("failed to build upstream client")?;
    Ok(McpServer::new(ToolHandlers::new(workflow)))
}

//! Rule Query: which business rules apply to an order for a stated purpose.
//!
//! The workspace is split into focused crates:
//!
//! * `rule-query-core`: configuration, error kinds and logging setup
//! * `rule-query-rules`: rule records, payload decoding and the status filter
//! * `rule-query-engine`: upstream HTTP lookups and the query workflow
//! * `rule-query-server`: MCP tool front end over stdio
//! * `rule-query-cli`: log viewer and server launcher (`rule-query-logs`)
//!
//! This crate re-exports the pieces needed to embed the workflow or the tool
//! server in another program.

pub use rule_query_core::{ErrorKind, ServiceConfig, UpstreamConfig};
pub use rule_query_engine::{
    MatchedRules, OrderStatus, OrderStatusReport, QueryResult, RuleQueryWorkflow, WorkflowError,
};
pub use rule_query_rules::{decode_rules, filter_rules, Rule, RuleFilter};
pub use rule_query_server::{build_server, McpServer, ToolHandlers};

//! Rule query engine: upstream lookups and the workflow that ties them to
//! the rule filter.

pub mod error;
pub mod order;
pub mod upstream;
pub mod workflow;

pub use error::WorkflowError;
pub use order::OrderStatus;
pub use upstream::{JsonResponse, UpstreamClient, UpstreamError};
pub use workflow::{
    require_non_empty, MatchedRules, OrderStatusReport, QueryResult, RuleQueryWorkflow,
};

//! Core shared library for the rule query service.
//!
//! This crate exposes the primitives every other crate in the workspace
//! depends on: the error kinds reported to tool callers, environment
//! driven configuration and the process-wide logging setup.

pub mod config;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use config::{ServiceConfig, UpstreamConfig};
pub use errors::{ConfigError, ErrorKind, Result as CoreResult, RuleQueryError};

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the core crate.
pub type Result<T> = std::result::Result<T, RuleQueryError>;

/// Error category reported to tool callers in the `error` field of a failed
/// invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A required argument is missing, empty or not a string.
    InvalidArgument,
    /// The order status endpoint did not report the order as existing.
    OrderNotFound,
    /// Network failure, timeout or malformed payload from an upstream.
    UpstreamError,
    /// Unexpected failure while filtering or formatting.
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::OrderNotFound => "OrderNotFound",
            ErrorKind::UpstreamError => "UpstreamError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical process-level error for startup and infrastructure failures.
#[derive(Debug, Error)]
pub enum RuleQueryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {key}: {source}")]
    InvalidEnvVar {
        key: &'static str,
        #[source]
        source: std::env::VarError,
    },

    #[error("invalid URL for {key}: {message}")]
    InvalidUrl { key: &'static str, message: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

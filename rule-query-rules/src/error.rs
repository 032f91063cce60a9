use thiserror::Error;

/// Errors returned when decoding a rule payload.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rules payload must be a list or an object, found {found}")]
    UnexpectedShape { found: &'static str },
    #[error("invalid rule {id}: {message}")]
    InvalidRule { id: String, message: String },
}

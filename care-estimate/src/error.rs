use thiserror::Error;

/// A single rejected input field.
///
/// Only the first offending field of a request is ever reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid estimator policy: {0}")]
    Config(String),

    #[error("Wizard step out of order: {0}")]
    Wizard(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_yaml::Error> for EstimateError {
    fn from(err: serde_yaml::Error) -> Self {
        EstimateError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EstimateError>;

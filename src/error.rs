use thiserror::Error;

use crate::schemas::SchemaValidationError;

/// Main error type for the knowledge pipeline
#[derive(Error, Debug)]
pub enum KnowledgeError {
    /// Payload failed contract validation
    #[error(transparent)]
    Validation(#[from] SchemaValidationError),

    /// Model API errors (network, HTTP status, malformed reply)
    #[error("Model API error: {0}")]
    ModelApi(String),
}

/// Convenient Result type using KnowledgeError
pub type Result<T> = std::result::Result<T, KnowledgeError>;

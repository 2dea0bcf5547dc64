//! Validation entry points for inbound payloads.
//!
//! Each entry point turns untyped data into a validated message or a
//! [`SchemaValidationError`] listing every offending field.

use super::checks;
use super::errors::{FieldError, SchemaValidationError};
use super::knowledge::{StoreKnowledgeRequest, StoreKnowledgeResponse};
use serde_json::Value;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::StoreKnowledgeRequest {}
    impl Sealed for super::StoreKnowledgeResponse {}
}

/// A top-level message of the agent-to-agent contract
pub trait Contract: Sized + sealed::Sealed {
    /// Type name used in diagnostics
    const NAME: &'static str;

    /// Validate an untyped value, returning every violation on failure
    fn from_value(value: &Value) -> Result<Self, Vec<FieldError>>;
}

impl Contract for StoreKnowledgeRequest {
    const NAME: &'static str = "StoreKnowledgeRequest";

    fn from_value(value: &Value) -> Result<Self, Vec<FieldError>> {
        checks::run(value, Self::collect)
    }
}

impl Contract for StoreKnowledgeResponse {
    const NAME: &'static str = "StoreKnowledgeResponse";

    fn from_value(value: &Value) -> Result<Self, Vec<FieldError>> {
        checks::run(value, Self::collect)
    }
}

/// Validate and parse a [`StoreKnowledgeRequest`] from untyped data
pub fn validate_request(data: &Value) -> Result<StoreKnowledgeRequest, SchemaValidationError> {
    StoreKnowledgeRequest::from_value(data)
        .map_err(|errors| SchemaValidationError::from_field_errors("Request validation failed", errors))
}

/// Validate and parse a [`StoreKnowledgeResponse`] from untyped data
pub fn validate_response(data: &Value) -> Result<StoreKnowledgeResponse, SchemaValidationError> {
    StoreKnowledgeResponse::from_value(data)
        .map_err(|errors| SchemaValidationError::from_field_errors("Response validation failed", errors))
}

/// Parse JSON text and validate it as `T` in one step.
///
/// Text that is not JSON at all is reported as a single `json_invalid` record.
pub fn validate_json<T: Contract>(json: &str) -> Result<T, SchemaValidationError> {
    let context = format!("JSON validation failed for {}", T::NAME);
    let value: Value = serde_json::from_str(json).map_err(|e| {
        SchemaValidationError::from_field_errors(&context, vec![FieldError::json_invalid(&e)])
    })?;
    T::from_value(&value).map_err(|errors| SchemaValidationError::from_field_errors(&context, errors))
}

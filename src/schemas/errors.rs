//! Structured validation failures.
//!
//! Every violation found while validating a payload becomes one [`FieldError`]
//! (location, machine-readable type, human-readable reason, offending input).
//! The validation entry points wrap the ordered list into a single
//! [`SchemaValidationError`] whose message joins them as
//! `"<dotted path>: <reason>"` separated by `"; "`.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// One step in the path to an offending field: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Machine-readable classification of a field violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    Missing,
    ExtraForbidden,
    ModelType,
    StringType,
    StringTooShort,
    IntType,
    IntParsing,
    IntFromFloat,
    GreaterThanEqual,
    LessThanEqual,
    BoolType,
    BoolParsing,
    ListType,
    TooShort,
    UuidType,
    UuidParsing,
    DatetimeType,
    DatetimeParsing,
    Enum,
    ValueError,
    JsonInvalid,
}

impl ErrorType {
    /// Wire name, also used for serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Missing => "missing",
            ErrorType::ExtraForbidden => "extra_forbidden",
            ErrorType::ModelType => "model_type",
            ErrorType::StringType => "string_type",
            ErrorType::StringTooShort => "string_too_short",
            ErrorType::IntType => "int_type",
            ErrorType::IntParsing => "int_parsing",
            ErrorType::IntFromFloat => "int_from_float",
            ErrorType::GreaterThanEqual => "greater_than_equal",
            ErrorType::LessThanEqual => "less_than_equal",
            ErrorType::BoolType => "bool_type",
            ErrorType::BoolParsing => "bool_parsing",
            ErrorType::ListType => "list_type",
            ErrorType::TooShort => "too_short",
            ErrorType::UuidType => "uuid_type",
            ErrorType::UuidParsing => "uuid_parsing",
            ErrorType::DatetimeType => "datetime_type",
            ErrorType::DatetimeParsing => "datetime_parsing",
            ErrorType::Enum => "enum",
            ErrorType::ValueError => "value_error",
            ErrorType::JsonInvalid => "json_invalid",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single field-level violation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub loc: Vec<PathSegment>,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl FieldError {
    pub fn new(
        error_type: ErrorType,
        loc: Vec<PathSegment>,
        msg: impl Into<String>,
        input: Option<Value>,
    ) -> Self {
        Self {
            error_type,
            loc,
            msg: msg.into(),
            input,
        }
    }

    /// Record for text that is not parseable JSON at all
    pub fn json_invalid(err: &serde_json::Error) -> Self {
        Self::new(
            ErrorType::JsonInvalid,
            Vec::new(),
            format!("Invalid JSON: {}", err),
            None,
        )
    }

    /// Dotted location, e.g. `chunks.0.metadata.chunk_index`. Empty for the payload root.
    pub fn path(&self) -> String {
        self.loc
            .iter()
            .map(|segment| segment.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loc.is_empty() {
            f.write_str(&self.msg)
        } else {
            write!(f, "{}: {}", self.path(), self.msg)
        }
    }
}

/// Raised when a payload does not satisfy the contract.
///
/// Carries every violation found in a single pass, not only the first one.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SchemaValidationError {
    message: String,
    errors: Vec<FieldError>,
}

impl SchemaValidationError {
    pub fn new(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            message: message.into(),
            errors,
        }
    }

    /// Build the aggregate error: `"<context>: <path>: <reason>; <path>: <reason>"`
    pub fn from_field_errors(context: &str, errors: Vec<FieldError>) -> Self {
        let details = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self::new(format!("{}: {}", context, details), errors)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Raw per-field records, in the order they were found
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Dotted paths of every offending field
    pub fn paths(&self) -> Vec<String> {
        self.errors.iter().map(FieldError::path).collect()
    }

    pub fn has_error_at(&self, path: &str) -> bool {
        self.errors.iter().any(|e| e.path() == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(loc: Vec<PathSegment>) -> FieldError {
        FieldError::new(ErrorType::Missing, loc, "Field required", None)
    }

    #[test]
    fn test_path_joins_keys_and_indices() {
        let err = missing(vec!["chunks".into(), 0.into(), "text".into()]);
        assert_eq!(err.path(), "chunks.0.text");
        assert_eq!(err.to_string(), "chunks.0.text: Field required");
    }

    #[test]
    fn test_root_error_has_no_path_prefix() {
        let parse_err = serde_json::from_str::<Value>("{not json").unwrap_err();
        let err = FieldError::json_invalid(&parse_err);
        assert_eq!(err.path(), "");
        assert!(err.to_string().starts_with("Invalid JSON: "));
    }

    #[test]
    fn test_aggregate_message_format() {
        let err = SchemaValidationError::from_field_errors(
            "Request validation failed",
            vec![missing(vec!["job_id".into()]), missing(vec!["chunks".into()])],
        );
        assert_eq!(
            err.message(),
            "Request validation failed: job_id: Field required; chunks: Field required"
        );
        assert_eq!(err.paths(), vec!["job_id", "chunks"]);
        assert!(err.has_error_at("chunks"));
        assert!(!err.has_error_at("trace_id"));
    }

    #[test]
    fn test_field_error_serializes_like_a_record() {
        let err = FieldError::new(
            ErrorType::GreaterThanEqual,
            vec!["page_number".into()],
            "Input should be greater than or equal to 1",
            Some(Value::from(0)),
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "greater_than_equal");
        assert_eq!(json["loc"], serde_json::json!(["page_number"]));
        assert_eq!(json["input"], 0);
    }

    #[test]
    fn test_error_type_serializes_as_wire_name() {
        for error_type in [ErrorType::ExtraForbidden, ErrorType::IntParsing, ErrorType::BoolParsing, ErrorType::JsonInvalid] {
            assert_eq!(serde_json::to_value(error_type).unwrap(), Value::from(error_type.as_str()));
            assert_eq!(error_type.to_string(), error_type.as_str());
        }
        assert_eq!(ErrorType::BoolParsing.as_str(), "bool_parsing");
    }
}

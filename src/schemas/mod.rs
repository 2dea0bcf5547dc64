//! Agent-to-agent message contract.
//!
//! Defines the payloads exchanged between the ingestion agent (producer) and
//! the database agent (consumer). Both sides must only send and accept values
//! that validate against these types.

mod checks;
pub mod consistency;
pub mod errors;
pub mod knowledge;
pub mod validation;

pub use consistency::ConsistencyIssue;
pub use errors::{ErrorType, FieldError, PathSegment, SchemaValidationError};
pub use knowledge::{
    ChunkMetadata, ChunkMetadataBuilder, KnowledgeChunk, KnowledgeChunkBuilder, ProcessingStatus,
    StoreKnowledgeRequest, StoreKnowledgeRequestBuilder, StoreKnowledgeResponse,
    StoreKnowledgeResponseBuilder, StoredChunkResult, VisualDescription,
};
pub use validation::{validate_json, validate_request, validate_response, Contract};

/// Version of the message contract
pub const SCHEMA_VERSION: &str = "1.0.0";

pub mod agents;
pub mod config;
pub mod error;
pub mod logging;
pub mod schemas;

pub use config::Config;
pub use error::{KnowledgeError, Result};
pub use schemas::{
    validate_json, validate_request, validate_response, SchemaValidationError,
    StoreKnowledgeRequest, StoreKnowledgeResponse,
};

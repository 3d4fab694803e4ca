//! Error types for the visual search service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Missing query parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("Model inference failed: {0}")]
    ModelInference(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Failed to fetch image {url}: {cause}")]
    ImageFetch { url: String, cause: String },

    #[error("Collection '{collection}' has an incompatible schema: {detail}")]
    SchemaMismatch { collection: String, detail: String },

    #[error("Batch upsert failed after retry: {0}")]
    BatchUpsert(String),

    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("Annotation id '{0}' does not end in a valid point id")]
    InvalidPointId(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// True for request-shaped failures that map to HTTP 400.
    pub fn is_validation(&self) -> bool {
        matches!(self, SearchError::MissingParameter(_))
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

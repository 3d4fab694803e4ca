//! Core functionality for the visual search service

pub mod config;
pub mod error;

pub use config::{Config, IndexingConfig, ModelConfig, QdrantConfig, ServerConfig};
pub use error::{Result, SearchError};

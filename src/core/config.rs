//! Configuration for the visual search service

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub qdrant: QdrantConfig,
    pub model: ModelConfig,
    pub indexing: IndexingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL under which the search endpoints are externally reachable.
    /// Embedded into the manifest's search-service descriptor.
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_name: String,
    pub models_dir: String,
    pub dimension: usize,
    pub input_resolution: u32,
    pub text_sequence_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub batch_size: usize,
    pub fetch_timeout: Duration,
    /// Keyword for the default label classifier.
    pub keyword: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5001,
                public_url: "http://localhost:5001".to_string(),
            },
            qdrant: QdrantConfig {
                url: "http://localhost:6333".to_string(),
                api_key: None,
                collection: "iiif_photos".to_string(),
            },
            model: ModelConfig {
                model_name: "siglip-so400m-patch14-384".to_string(),
                models_dir: "./models".to_string(),
                dimension: 1152,
                input_resolution: 384,
                text_sequence_length: 64,
            },
            indexing: IndexingConfig {
                batch_size: 32,
                fetch_timeout: Duration::from_secs(30),
                keyword: "photograph".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> crate::core::Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("SEARCH_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("SEARCH_PORT") {
            config.server.port = port.parse().unwrap_or(5001);
        }
        if let Ok(public_url) = std::env::var("SEARCH_BASE_URL") {
            config.server.public_url = public_url.trim_end_matches('/').to_string();
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.qdrant.url = url;
        }
        if let Ok(api_key) = std::env::var("QDRANT_API_KEY") {
            config.qdrant.api_key = Some(api_key);
        }
        if let Ok(collection) = std::env::var("COLLECTION_NAME") {
            config.qdrant.collection = collection;
        }
        if let Ok(model_name) = std::env::var("SIGLIP_MODEL") {
            config.model.model_name = model_name;
        }
        if let Ok(models_dir) = std::env::var("MODELS_DIR") {
            config.model.models_dir = models_dir;
        }
        if let Ok(timeout) = std::env::var("FETCH_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                config.indexing.fetch_timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(batch_size) = std::env::var("INDEX_BATCH_SIZE") {
            if let Ok(size) = batch_size.parse() {
                config.indexing.batch_size = size;
            }
        }
        if let Ok(keyword) = std::env::var("SEARCH_KEYWORD") {
            config.indexing.keyword = keyword;
        }

        Ok(config)
    }
}

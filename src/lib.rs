//! Content-based visual search over IIIF Presentation manifests.
//!
//! An offline indexer walks a manifest's annotation graph, embeds each
//! searchable image region with a multimodal model, and upserts the vectors
//! into Qdrant; the query service embeds free-text queries into the same
//! space and answers with an IIIF Search API annotation list.

pub mod api;
pub mod core;
pub mod indexer;
pub mod manifest;
pub mod models;
pub mod storage;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::core::{Config, Result};
use crate::models::{Embedder, SiglipEmbedder};
use crate::storage::{QdrantStore, VectorStore};

/// Application state for Axum. Constructed once at startup; the embedding
/// model and store client are shared read-only across all requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn VectorStore>,
}

pub struct VisualSearchService {
    pub config: Config,
    pub embedder: Arc<SiglipEmbedder>,
    pub store: Arc<QdrantStore>,
}

impl VisualSearchService {
    pub fn new(config: Config) -> Result<Self> {
        let embedder = Arc::new(SiglipEmbedder::new(&config.model));
        let store = Arc::new(QdrantStore::new(&config.qdrant)?);

        Ok(Self {
            config,
            embedder,
            store,
        })
    }

    /// Load the embedding model once, before serving traffic.
    pub async fn initialize_model(&self) -> Result<()> {
        self.embedder.warm_up().await
    }

    pub fn app_state(self) -> AppState {
        AppState {
            config: Arc::new(self.config),
            embedder: self.embedder,
            store: self.store,
        }
    }
}

/// Route table for the query service.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::landing_page))
        .route("/health", get(api::health_check))
        .route("/search", get(api::search))
        .route("/search/autocomplete", get(api::autocomplete))
        .with_state(state)
}

//! Vector storage for region embeddings

pub mod qdrant;

pub use qdrant::QdrantStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::Result;

pub const DEFAULT_TOP_K: usize = 10;

/// Distance metric of a collection. Variant names follow the Qdrant wire
/// vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Cosine,
    Euclid,
    Dot,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "Cosine",
            Metric::Euclid => "Euclid",
            Metric::Dot => "Dot",
        }
    }
}

/// Payload stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub canvas_id: String,
    pub annotation_id: String,
    pub label: String,
    pub xywh: String,
    pub thumbnail_url: String,
    pub manifest_id: String,
}

/// One record in a collection. Upserting an existing id replaces the prior
/// vector and payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// Ranked query result, highest similarity first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: f32,
    pub payload: PointPayload,
}

/// Exact-match filter on one payload field.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadFilter {
    pub key: String,
    pub value: String,
}

impl PayloadFilter {
    pub fn manifest(id: &str) -> Self {
        Self {
            key: "manifest_id".to_string(),
            value: id.to_string(),
        }
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotent collection provisioning. Creates the collection when
    /// absent; fails with `SchemaMismatch` when an existing collection's
    /// dimension or metric differs from the requested one.
    async fn ensure_collection(&self, dimension: usize, metric: Metric) -> Result<()>;

    /// At-least-once batch write, idempotent per id. A failed batch is
    /// retried once as a whole, then surfaced as `BatchUpsert`.
    async fn upsert(&self, points: &[IndexPoint]) -> Result<()>;

    /// Top-k nearest neighbors, ordered by descending similarity.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&PayloadFilter>,
    ) -> Result<Vec<SearchHit>>;

    /// Backend reachability, for health reporting.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

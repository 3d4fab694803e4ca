//! Qdrant-backed vector store over the REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::{QdrantConfig, Result, SearchError};
use crate::storage::{IndexPoint, Metric, PayloadFilter, PointPayload, SearchHit, VectorStore};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    result: CollectionResult,
}

#[derive(Debug, Deserialize)]
struct CollectionResult {
    config: CollectionConfig,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    points: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    payload: PointPayload,
}

pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
}

impl QdrantStore {
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SearchError::Store(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            collection: config.collection.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(api_key) = &self.api_key {
            builder = builder.header("api-key", api_key);
        }
        builder
    }

    /// Current vector parameters of the collection, or `None` when it does
    /// not exist yet.
    async fn collection_params(&self) -> Result<Option<VectorParams>> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/collections/{}", self.collection),
            )
            .send()
            .await
            .map_err(|e| SearchError::Store(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Store(format!(
                "Qdrant returned {}: {}",
                status, body
            )));
        }

        let info: CollectionResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Store(e.to_string()))?;
        Ok(Some(info.result.config.params.vectors))
    }

    async fn create_collection(&self, dimension: usize, metric: Metric) -> Result<()> {
        let body = json!({
            "vectors": { "size": dimension, "distance": metric.as_str() }
        });
        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}", self.collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Store(e.to_string()))?;

        if response.status().is_success() {
            tracing::info!(collection = %self.collection, dimension, "created collection");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SearchError::Store(format!(
                "failed to create collection: {} {}",
                status, body
            )))
        }
    }

    async fn try_upsert(&self, points: &[IndexPoint]) -> Result<()> {
        let body = json!({ "points": points });
        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}/points?wait=true", self.collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Store(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SearchError::Store(format!(
                "upsert returned {}: {}",
                status, body
            )))
        }
    }
}

/// `Some(detail)` when an existing collection's schema differs from the
/// requested one.
fn schema_mismatch(existing: &VectorParams, dimension: usize, metric: Metric) -> Option<String> {
    if existing.size != dimension {
        return Some(format!(
            "dimension {} does not match requested {}",
            existing.size, dimension
        ));
    }
    if existing.distance != metric.as_str() {
        return Some(format!(
            "metric {} does not match requested {}",
            existing.distance,
            metric.as_str()
        ));
    }
    None
}

fn filter_clause(filter: &PayloadFilter) -> serde_json::Value {
    json!({
        "must": [{ "key": filter.key, "match": { "value": filter.value } }]
    })
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, dimension: usize, metric: Metric) -> Result<()> {
        match self.collection_params().await? {
            None => self.create_collection(dimension, metric).await,
            Some(existing) => match schema_mismatch(&existing, dimension, metric) {
                None => Ok(()),
                Some(detail) => Err(SearchError::SchemaMismatch {
                    collection: self.collection.clone(),
                    detail,
                }),
            },
        }
    }

    async fn upsert(&self, points: &[IndexPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        if let Err(first) = self.try_upsert(points).await {
            tracing::warn!(error = %first, count = points.len(), "batch upsert failed, retrying once");
            self.try_upsert(points)
                .await
                .map_err(|second| SearchError::BatchUpsert(second.to_string()))?;
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&PayloadFilter>,
    ) -> Result<Vec<SearchHit>> {
        let mut body = json!({
            "query": vector,
            "limit": top_k,
            "with_payload": true,
        });
        if let Some(filter) = filter {
            body["filter"] = filter_clause(filter);
        }

        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/query", self.collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Store(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Store(format!(
                "query returned {}: {}",
                status, body
            )));
        }

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Store(e.to_string()))?;

        Ok(result
            .result
            .points
            .into_iter()
            .map(|point| SearchHit {
                score: point.score,
                payload: point.payload,
            })
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .request(reqwest::Method::GET, "/collections")
            .send()
            .await
            .map_err(|e| SearchError::Store(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(SearchError::Store(format!(
                "Qdrant returned {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn schema_mismatch_detects_dimension_and_metric() {
        let existing = VectorParams {
            size: 1152,
            distance: "Cosine".to_string(),
        };
        assert!(schema_mismatch(&existing, 1152, Metric::Cosine).is_none());
        assert!(schema_mismatch(&existing, 768, Metric::Cosine)
            .is_some_and(|detail| detail.contains("dimension")));
        assert!(schema_mismatch(&existing, 1152, Metric::Euclid)
            .is_some_and(|detail| detail.contains("metric")));
    }

    #[test]
    fn points_serialize_with_uuid_ids_and_payload() {
        let point = IndexPoint {
            id: Uuid::parse_str("5a787182-2dbd-42eb-98e2-a8c1e224e04e").unwrap(),
            vector: vec![0.1, 0.2],
            payload: PointPayload {
                canvas_id: "C1".into(),
                annotation_id: "C1/annotation/5a787182-2dbd-42eb-98e2-a8c1e224e04e".into(),
                label: "photograph: dog".into(),
                xywh: "10,10,50,50".into(),
                thumbnail_url: "https://img/svc/10,10,50,50/max/0/default.jpg".into(),
                manifest_id: "https://example.org/manifest.json".into(),
            },
        };
        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(value["id"], "5a787182-2dbd-42eb-98e2-a8c1e224e04e");
        assert_eq!(value["payload"]["xywh"], "10,10,50,50");
        assert_eq!(value["payload"]["canvas_id"], "C1");
    }

    #[test]
    fn filter_clause_matches_payload_field() {
        let clause = filter_clause(&PayloadFilter::manifest("https://example.org/m.json"));
        assert_eq!(clause["must"][0]["key"], "manifest_id");
        assert_eq!(clause["must"][0]["match"]["value"], "https://example.org/m.json");
    }
}

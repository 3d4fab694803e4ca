//! Manifest indexing pipeline.
//!
//! Walks a manifest for searchable regions, fetches and embeds each crop,
//! and upserts the results into the vector store in batches. Per-region
//! failures are logged and skipped; only collection provisioning failures
//! abort the run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use serde_json::json;
use uuid::Uuid;

use crate::core::{Result, SearchError};
use crate::manifest::{searchable_regions, Classifier, Manifest, SearchableRegion};
use crate::models::Embedder;
use crate::storage::{IndexPoint, Metric, PointPayload, VectorStore};


/// Fetches and decodes a crop image.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<DynamicImage>;
}

/// HTTP fetcher with a bounded per-request timeout, so an unreachable image
/// source delays only its own region.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_image(&self, url: &str) -> Result<DynamicImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SearchError::ImageFetch {
                url: url.to_string(),
                cause: e.to_string(),
            })?;
        let bytes = response.bytes().await.map_err(|e| SearchError::ImageFetch {
            url: url.to_string(),
            cause: e.to_string(),
        })?;
        image::load_from_memory(&bytes).map_err(|e| SearchError::ImageFetch {
            url: url.to_string(),
            cause: e.to_string(),
        })
    }
}

/// Point id is the final path segment of the annotation id, which must be a
/// UUID the store accepts. Anything else is an explicit validation failure;
/// there is no hashing fallback.
pub fn derive_point_id(annotation_id: &str) -> Result<Uuid> {
    let tail = annotation_id.rsplit('/').next().unwrap_or(annotation_id);
    Uuid::parse_str(tail).map_err(|_| SearchError::InvalidPointId(annotation_id.to_string()))
}

/// Set the IIIF Search API service descriptor on the manifest: the search
/// and autocomplete endpoints under the given base URL.
pub fn attach_search_service(manifest: &mut Manifest, public_url: &str) {
    let descriptor = json!({
        "@context": "http://iiif.io/api/search/0/context.json",
        "@id": format!("{public_url}/search"),
        "profile": "http://iiif.io/api/search/0/search",
        "label": "Image Content Search",
        "service": {
            "@id": format!("{public_url}/search/autocomplete"),
            "profile": "http://iiif.io/api/search/0/autocomplete",
            "label": "Autocomplete"
        }
    });
    manifest.service = vec![descriptor];
}

#[derive(Debug)]
pub struct IndexOutcome {
    pub points_indexed: usize,
    pub manifest: Manifest,
}

pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    fetcher: Arc<dyn ImageFetcher>,
    classifier: Arc<dyn Classifier>,
    batch_size: usize,
    public_url: String,
}

impl Indexer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        fetcher: Arc<dyn ImageFetcher>,
        classifier: Arc<dyn Classifier>,
        batch_size: usize,
        public_url: &str,
    ) -> Self {
        Self {
            embedder,
            store,
            fetcher,
            classifier,
            batch_size,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Index every searchable region of the manifest, then attach the
    /// search-service descriptor. Returns the number of points written and
    /// the updated manifest for persistence by the caller.
    pub async fn run(&self, mut manifest: Manifest) -> Result<IndexOutcome> {
        self.store
            .ensure_collection(self.embedder.dimension(), Metric::Cosine)
            .await?;

        let regions: Vec<SearchableRegion> =
            searchable_regions(&manifest, self.classifier.as_ref()).collect();
        tracing::info!(regions = regions.len(), manifest = %manifest.id, "indexing annotations");

        let mut points = Vec::with_capacity(regions.len());
        for region in &regions {
            match self.build_point(&manifest.id, region).await {
                Ok(point) => points.push(point),
                Err(e) => {
                    tracing::warn!(
                        annotation = %region.annotation_id,
                        error = %e,
                        "skipping region"
                    );
                }
            }
        }

        let mut points_indexed = 0;
        for batch in points.chunks(self.batch_size) {
            match self.store.upsert(batch).await {
                Ok(()) => points_indexed += batch.len(),
                Err(e) => {
                    tracing::error!(error = %e, count = batch.len(), "dropping batch");
                }
            }
        }

        attach_search_service(&mut manifest, &self.public_url);
        Ok(IndexOutcome {
            points_indexed,
            manifest,
        })
    }

    async fn build_point(&self, manifest_id: &str, region: &SearchableRegion) -> Result<IndexPoint> {
        let id = derive_point_id(&region.annotation_id)?;

        tracing::debug!(annotation = %region.annotation_id, crop = %region.crop_url, "embedding region");
        let image = self.fetcher.fetch_image(&region.crop_url).await?;
        let vector = self.embedder.embed_image(image).await?;

        Ok(IndexPoint {
            id,
            vector,
            payload: PointPayload {
                canvas_id: region.canvas_id.clone(),
                annotation_id: region.annotation_id.clone(),
                label: region.label.clone(),
                xywh: region.region.to_string(),
                thumbnail_url: region.crop_url.clone(),
                manifest_id: manifest_id.to_string(),
            },
        })
    }
}

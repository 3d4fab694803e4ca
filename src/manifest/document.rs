//! Typed IIIF Presentation documents.
//!
//! The indexer reads manifests produced upstream and rewrites them with a
//! search-service descriptor attached, so every struct carries a flattened
//! map of the fields it does not model. Required fields are enforced at the
//! parse boundary and reported as `MalformedManifest`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{Result, SearchError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<Canvas>,
    /// Service blocks attached to the manifest (the indexer appends one).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub width: u32,
    pub height: u32,
    /// Painting annotation pages (the canvas's displayed image).
    #[serde(default)]
    pub items: Vec<AnnotationPage>,
    /// Commenting annotation pages.
    #[serde(default)]
    pub annotations: Vec<AnnotationPage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<Annotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub motivation: String,
    pub body: AnnotationBody,
    pub target: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Textual label for `TextualBody` bodies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<ImageService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageService {
    #[serde(alias = "@id")]
    pub id: String,
    #[serde(rename = "type", alias = "@type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Parse and validate a manifest document.
    pub fn parse(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json)
            .map_err(|e| SearchError::MalformedManifest(e.to_string()))?;

        if manifest.kind != "Manifest" {
            return Err(SearchError::MalformedManifest(format!(
                "expected document of type 'Manifest', found '{}'",
                manifest.kind
            )));
        }
        for canvas in &manifest.items {
            if canvas.width == 0 || canvas.height == 0 {
                return Err(SearchError::MalformedManifest(format!(
                    "canvas '{}' has zero width or height",
                    canvas.id
                )));
            }
        }

        Ok(manifest)
    }
}

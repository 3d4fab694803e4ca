//! IIIF Search API 0 response formatting.
//!
//! Maps ranked vector-store hits onto the `AnnotationList` shape viewers
//! expect: one annotation resource per hit plus a parallel `hits` summary.

use serde::Serialize;

use crate::storage::SearchHit;

pub const PRESENTATION_CONTEXT: &str = "http://iiif.io/api/presentation/2/context.json";
pub const SEARCH_CONTEXT: &str = "http://iiif.io/api/search/0/context.json";
pub const TERM_LIST_CONTEXT: &str = "http://iiif.io/api/search/1/context.json";

#[derive(Debug, Serialize)]
pub struct AnnotationList {
    #[serde(rename = "@context")]
    pub context: [&'static str; 2],
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub within: Layer,
    pub resources: Vec<AnnotationResource>,
    pub hits: Vec<Hit>,
}

#[derive(Debug, Serialize)]
pub struct Layer {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct AnnotationResource {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub motivation: &'static str,
    pub resource: TextResource,
    pub on: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextResource {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub chars: String,
}

#[derive(Debug, Serialize)]
pub struct Hit {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub annotations: [String; 1],
}

/// Autocomplete stub response.
#[derive(Debug, Serialize)]
pub struct TermList {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub terms: Vec<String>,
}

impl TermList {
    pub fn empty(url: &str) -> Self {
        Self {
            context: TERM_LIST_CONTEXT,
            id: url.to_string(),
            kind: "search:TermList",
            terms: Vec::new(),
        }
    }
}

/// Build the annotation list for a ranked hit sequence. Annotation ids are
/// synthesized as `{base_url}/anno/{rank}`, 0-based in hit order.
pub fn format_annotation_list(
    query_url: &str,
    base_url: &str,
    hits: &[SearchHit],
) -> AnnotationList {
    let mut resources = Vec::with_capacity(hits.len());
    let mut hit_entries = Vec::with_capacity(hits.len());

    for (index, hit) in hits.iter().enumerate() {
        let annotation_id = format!("{base_url}/anno/{index}");
        let thumbnail = if hit.payload.thumbnail_url.is_empty() {
            None
        } else {
            Some(hit.payload.thumbnail_url.clone())
        };

        resources.push(AnnotationResource {
            id: annotation_id.clone(),
            kind: "oa:Annotation",
            motivation: "sc:painting",
            resource: TextResource {
                kind: "cnt:ContentAsText",
                chars: hit.payload.label.clone(),
            },
            on: format!("{}#xywh={}", hit.payload.canvas_id, hit.payload.xywh),
            thumbnail,
        });
        hit_entries.push(Hit {
            kind: "search:Hit",
            annotations: [annotation_id],
        });
    }

    AnnotationList {
        context: [PRESENTATION_CONTEXT, SEARCH_CONTEXT],
        id: query_url.to_string(),
        kind: "sc:AnnotationList",
        within: Layer {
            kind: "sc:Layer",
            total: resources.len(),
        },
        resources,
        hits: hit_entries,
    }
}

//! Search endpoints

use axum::{
    extract::{Query, State},
    response::{Html, Json},
};
use serde::Deserialize;

use crate::api::format::{format_annotation_list, AnnotationList, TermList};
use crate::core::SearchError;
use crate::storage::{PayloadFilter, DEFAULT_TOP_K};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Optional filter restricting hits to one manifest.
    pub manifest: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<AnnotationList>, SearchError> {
    let query = params
        .q
        .filter(|q| !q.is_empty())
        .ok_or(SearchError::MissingParameter("q"))?;
    tracing::info!(query = %query, manifest = ?params.manifest, "search query");

    let vector = state.embedder.embed_text(&query).await?;
    let filter = params.manifest.as_deref().map(PayloadFilter::manifest);
    let hits = state
        .store
        .query(&vector, DEFAULT_TOP_K, filter.as_ref())
        .await?;

    let base_url = format!("{}/search", state.config.server.public_url);
    let query_url = request_url(&base_url, &query, params.manifest.as_deref());
    Ok(Json(format_annotation_list(&query_url, &base_url, &hits)))
}

pub async fn autocomplete(State(state): State<AppState>) -> Json<TermList> {
    let url = format!("{}/search/autocomplete", state.config.server.public_url);
    Json(TermList::empty(&url))
}

pub async fn landing_page() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html>\n<html>\n<head><title>IIIF Visual Search</title></head>\n\
         <body>\n<h1>IIIF Visual Search</h1>\n\
         <p>Query annotated image regions with <code>GET /search?q=...</code></p>\n\
         </body>\n</html>\n",
    )
}

fn request_url(base_url: &str, query: &str, manifest: Option<&str>) -> String {
    let mut url = format!("{base_url}?q={}", urlencoding::encode(query));
    if let Some(manifest) = manifest {
        url.push_str(&format!("&manifest={}", urlencoding::encode(manifest)));
    }
    url
}

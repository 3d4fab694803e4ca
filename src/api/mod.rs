//! HTTP API for the visual search service

pub mod format;
pub mod health;
pub mod search;

pub use format::{format_annotation_list, AnnotationList, TermList};
pub use health::health_check;
pub use search::{autocomplete, landing_page, search};

#[cfg(test)]
mod format_test;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::core::SearchError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// The one place query-time failures become HTTP responses: validation
/// failures are 400, everything else is 500, always with a JSON error body.
impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;

use super::engine::{SearchEngine, SearchError};
use super::types::SearchRequest;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /api/v1/search?query=go&type=video&sort=popularity&page=1&page_size=20
pub async fn handle_search(
    Query(request): Query<SearchRequest>,
    Extension(engine): Extension<Arc<SearchEngine>>,
) -> Response {
    match engine.execute(request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(SearchError::Validation(message)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: message }),
        )
            .into_response(),
        Err(err) => {
            // Details go to the log; the client gets a generic message and
            // can correlate through the request-id header.
            tracing::error!("Search failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal server error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

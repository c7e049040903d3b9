use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use super::orchestrator::SyncOrchestrator;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: String,
    pub status: String,
}

/// POST /api/v1/admin/sync. Fires a background sync and returns at once.
pub async fn handle_sync(
    Extension(orchestrator): Extension<Arc<SyncOrchestrator>>,
) -> (StatusCode, Json<SyncResponse>) {
    orchestrator.sync_all_async();

    (
        StatusCode::ACCEPTED,
        Json(SyncResponse {
            message: "sync started".to_string(),
            status: "running".to_string(),
        }),
    )
}

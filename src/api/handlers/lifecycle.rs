use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::uploads::{upload_to_response, UploadResponse};
use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::bulk::{BulkArchiveOutcome, BulkDeleteOutcome};
use crate::stats;
use crate::storage::models::UploadView;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BulkIdsRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub view: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub view: String,
    pub total: usize,
    pub last_activity: Option<String>,
    pub last_activity_label: String,
    pub new_uploads: usize,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn archive_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<UploadResponse>>, ApiError> {
    let record = state.archiver.archive(&id)?;
    Ok(JSend::success(upload_to_response(&record)))
}

pub async fn unarchive_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<UploadResponse>>, ApiError> {
    let record = state.archiver.unarchive(&id)?;
    Ok(JSend::success(upload_to_response(&record)))
}

pub async fn bulk_delete_uploads(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<BulkIdsRequest>,
) -> Result<Json<JSend<BulkDeleteOutcome>>, ApiError> {
    let outcome = state.bulk.bulk_delete(&req.ids).await?;
    Ok(JSend::success(outcome))
}

pub async fn bulk_archive_uploads(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<BulkIdsRequest>,
) -> Result<Json<JSend<BulkArchiveOutcome>>, ApiError> {
    let outcome = state.bulk.bulk_archive(&req.ids).await?;
    Ok(JSend::success(outcome))
}

pub async fn view_stats(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<StatsParams>,
) -> Result<Json<JSend<StatsResponse>>, ApiError> {
    let view = UploadView::from_str(&params.view).map_err(ApiError::bad_request)?;

    let records = state.db.get_all_uploads()?;
    let stats = stats::view_stats(&records, &view, Utc::now());

    Ok(JSend::success(StatsResponse {
        view: view.to_string(),
        total: stats.total,
        last_activity: stats.last_activity.map(|ts| ts.to_rfc3339()),
        last_activity_label: stats.last_activity_label(),
        new_uploads: stats.new_uploads,
    }))
}

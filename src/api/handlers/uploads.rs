use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppQuery, JSend};
use crate::storage::models::{
    ListFilter, SortBy, SortOrder, TabCategory, UploadRecord, UploadStatus, UploadView,
};
use crate::uploader::{IncomingFile, UploadError};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub tab_category: TabCategory,
    pub status: UploadStatus,
    pub storage_path: Option<String>,
    pub metadata: MetadataResponse,
    pub error_message: Option<String>,
    pub uploaded_at: String,
    pub processed_at: Option<String>,
    pub archived: bool,
    pub archived_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub original_name: String,
    pub progress: u8,
    pub upload_timestamp: String,
}

/// Per-file outcome of a multipart submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub accepted: Vec<UploadResponse>,
    /// Files the category policy turned away; no record exists for these.
    pub rejected: Vec<SubmitDiagnostic>,
    /// Files that failed after a record was created.
    pub failed: Vec<SubmitDiagnostic>,
}

#[derive(Debug, Serialize)]
pub struct SubmitDiagnostic {
    pub file_name: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListUploadsParams {
    /// One of catalog / royalties / agreements / archive. Absent means
    /// all categories, archived hidden.
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub limit: Option<usize>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Multipart upload: one `category` text field plus one or more `file`
/// fields. Each file runs as its own concurrent submission; the
/// response reports per-file outcomes.
pub async fn create_uploads(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<SubmitResponse>>, ApiError> {
    let mut category: Option<String> = None;
    let mut files: Vec<IncomingFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "category" => {
                category = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid category: {e}")))?,
                );
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let content_type = field.content_type().map(|s| s.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

                if data.len() as u64 > state.config.max_upload_size {
                    return Err(ApiError::payload_too_large(format!(
                        "File {} exceeds maximum upload size of {} bytes",
                        file_name, state.config.max_upload_size
                    )));
                }

                // Mime from the multipart Content-Type, or guessed from
                // the filename, or a generic fallback
                let mime_type = content_type
                    .filter(|ct| ct != "application/octet-stream")
                    .or_else(|| {
                        mime_guess::from_path(&file_name)
                            .first()
                            .map(|m| m.to_string())
                    })
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                files.push(IncomingFile {
                    file_name,
                    mime_type,
                    data,
                });
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let category = category.ok_or_else(|| ApiError::bad_request("category field is required"))?;
    let category = TabCategory::from_str(&category).map_err(ApiError::bad_request)?;
    if files.is_empty() {
        return Err(ApiError::bad_request("at least one file field is required"));
    }

    let mut response = SubmitResponse {
        accepted: Vec::new(),
        rejected: Vec::new(),
        failed: Vec::new(),
    };

    let mut submissions = Vec::new();
    for file in files {
        let uploader = state.uploader.clone();
        let file_name = file.file_name.clone();
        let handle = tokio::spawn(async move { uploader.submit_and_wait(file, category).await });
        submissions.push((file_name, handle));
    }

    for (file_name, handle) in submissions {
        match handle.await {
            Ok(Ok(record)) => response.accepted.push(upload_to_response(&record)),
            Ok(Err(e @ UploadError::Rejected { .. })) => {
                response.rejected.push(SubmitDiagnostic {
                    file_name,
                    message: e.to_string(),
                })
            }
            Ok(Err(e)) => {
                tracing::warn!(file_name = %file_name, error = %e, "Upload submission failed");
                response.failed.push(SubmitDiagnostic {
                    file_name,
                    message: e.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(file_name = %file_name, error = %e, "Upload task panicked");
                response.failed.push(SubmitDiagnostic {
                    file_name,
                    message: format!("upload task failed: {e}"),
                });
            }
        }
    }

    Ok(JSend::success(response))
}

pub async fn list_uploads(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListUploadsParams>,
) -> Result<Json<JSend<Vec<UploadResponse>>>, ApiError> {
    let mut filter = match params.view.as_deref() {
        Some(view) => UploadView::from_str(view)
            .map_err(ApiError::bad_request)?
            .filter(),
        None => ListFilter::default(),
    };

    if let Some(ref status) = params.status {
        filter.status = Some(UploadStatus::from_str(status).map_err(ApiError::bad_request)?);
    }
    filter.search = params.search.clone();
    filter.sort_by = params.sort_by;
    filter.sort_order = params.sort_order;
    filter.limit = params.limit;

    let records = state.db.list_uploads(&filter)?;
    Ok(JSend::success(
        records.iter().map(upload_to_response).collect(),
    ))
}

pub async fn get_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<UploadResponse>>, ApiError> {
    let record = state
        .db
        .get_upload(&id)?
        .ok_or_else(|| ApiError::not_found("Upload not found"))?;

    Ok(JSend::success(upload_to_response(&record)))
}

/// Delete a single upload: the record first, then the blob best-effort.
pub async fn delete_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    let record = state
        .db
        .delete_upload(&id)?
        .ok_or_else(|| ApiError::not_found("Upload not found"))?;

    if let Some(ref path) = record.storage_path {
        if let Err(e) = state.object_store.delete(path).await {
            tracing::warn!(upload_id = %id, error = %e, "Failed to delete blob from object storage");
        }
    }

    tracing::debug!(upload_id = %id, "Deleted upload");
    Ok(JSend::success(()))
}

/// Serve an upload's stored bytes.
/// Route: GET /uploads/:id/download
pub async fn download_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state
        .db
        .get_upload(&id)?
        .ok_or_else(|| ApiError::not_found("Upload not found"))?;

    let path = record
        .storage_path
        .as_deref()
        .ok_or_else(|| ApiError::not_found("Upload has no stored content"))?;

    let data = state.object_store.get(path).await.map_err(|e| match e {
        crate::object_store::ObjectStoreError::NotFound(_) => {
            ApiError::not_found("Upload content not found")
        }
        _ => ApiError::internal(format!("Failed to retrieve upload: {e}")),
    })?;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        record
            .file_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        header::HeaderValue::from(record.file_size),
    );
    if let Ok(value) = format!("attachment; filename=\"{}\"", record.file_name).parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

// ============================================================================
// Helpers
// ============================================================================

pub(super) fn upload_to_response(record: &UploadRecord) -> UploadResponse {
    UploadResponse {
        id: record.id.clone(),
        file_name: record.file_name.clone(),
        file_size: record.file_size,
        file_type: record.file_type.clone(),
        tab_category: record.tab_category,
        status: record.status,
        storage_path: record.storage_path.clone(),
        metadata: MetadataResponse {
            original_name: record.metadata.original_name.clone(),
            progress: record.metadata.progress,
            upload_timestamp: record.metadata.upload_timestamp.to_rfc3339(),
        },
        error_message: record.error_message.clone(),
        uploaded_at: record.uploaded_at.to_rfc3339(),
        processed_at: record.processed_at.map(|ts| ts.to_rfc3339()),
        archived: record.archived,
        archived_at: record.archived_at.map(|ts| ts.to_rfc3339()),
    }
}

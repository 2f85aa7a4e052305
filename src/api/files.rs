//! File download endpoint
//!
//! Streams a stored attachment with its recorded content type and bumps
//! the download counter best-effort. Plain static serving of the uploads
//! directory is wired in the router via `ServeDir`.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};

use axum::Json;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Attachment, AttachmentOwner};

/// GET /api/v1/files/{owner}/{owner_id} - Attachments of a project or post
pub async fn list_attachments(
    State(state): State<AppState>,
    Path((owner, owner_id)): Path<(String, i64)>,
) -> Result<Json<Vec<Attachment>>, ApiError> {
    let owner: AttachmentOwner = owner
        .parse()
        .map_err(|_| ApiError::validation_error("Invalid attachment owner"))?;

    let files = state
        .attachment_repo
        .list_by_owner(owner, owner_id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(files))
}

/// GET /api/v1/files/{owner}/{id}/download
pub async fn download_attachment(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, i64)>,
) -> Result<Response, ApiError> {
    let owner: AttachmentOwner = owner
        .parse()
        .map_err(|_| ApiError::validation_error("Invalid attachment owner"))?;

    let attachment = state
        .attachment_repo
        .get_by_id(owner, id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Attachment not found"))?;

    let disk_path = state.upload_config.path.join(&attachment.stored_path);
    let data = tokio::fs::read(&disk_path)
        .await
        .map_err(|_| ApiError::not_found("Stored file is missing"))?;

    // Lost download counts are acceptable
    if let Err(e) = state.attachment_repo.increment_download(owner, id).await {
        tracing::debug!("Failed to record download for {} {}: {}", owner, id, e);
    }

    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment.original_name.replace('"', "")
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &attachment.content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| ApiError::internal_error(e.to_string()))
}

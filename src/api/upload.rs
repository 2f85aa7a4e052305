//! Upload API endpoints
//!
//! Multipart uploads land under the uploads directory in a subfolder
//! picked by a MIME-type lookup table, with a UUID filename. Uploaded
//! files can then be attached to a project or post.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::{Path as FsPath, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Attachment, AttachmentOwner, NewAttachment};

/// Storage subfolder for a MIME type.
///
/// Unknown types fall through to `misc`.
pub fn subfolder_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/png" | "image/gif" | "image/webp" | "image/svg+xml"
        | "image/bmp" | "image/x-icon" => "images",
        "application/pdf" | "text/plain" | "text/markdown" | "application/msword"
        | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "documents",
        "video/mp4" | "video/webm" | "video/ogg" => "videos",
        "audio/mpeg" | "audio/ogg" | "audio/wav" => "audio",
        "application/zip" | "application/gzip" | "application/x-tar"
        | "application/x-7z-compressed" => "archives",
        _ => "misc",
    }
}

/// Format a byte count for humans, e.g. "4.2 MB".
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, UNITS[unit])
}

/// File extension from the original filename, or from the MIME type as a
/// fallback.
fn get_extension(filename: &str, content_type: &str) -> String {
    if let Some(ext) = FsPath::new(filename).extension().and_then(|e| e.to_str()) {
        if !ext.is_empty() && ext.len() < 10 {
            return ext.to_lowercase();
        }
    }

    match content_type {
        "image/jpeg" => "jpg".to_string(),
        "image/png" => "png".to_string(),
        "image/gif" => "gif".to_string(),
        "image/webp" => "webp".to_string(),
        "image/svg+xml" => "svg".to_string(),
        "application/pdf" => "pdf".to_string(),
        "application/zip" => "zip".to_string(),
        "video/mp4" => "mp4".to_string(),
        "video/webm" => "webm".to_string(),
        _ => "bin".to_string(),
    }
}

async fn ensure_dir(path: &PathBuf) -> Result<(), ApiError> {
    if !path.exists() {
        fs::create_dir_all(path)
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to create upload dir: {}", e)))?;
    }
    Ok(())
}

/// Response for a stored upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Public URL under /uploads
    pub url: String,
    /// Path relative to the uploads directory
    pub stored_path: String,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
    pub size_formatted: String,
}

/// POST /api/v1/admin/uploads - Store a multipart file upload
///
/// Accepts multipart/form-data with a single field named "file".
pub async fn upload_file(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let config = &state.upload_config;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !config.is_type_allowed(&content_type) {
            return Err(ApiError::validation_error(format!(
                "File type not allowed: {}",
                content_type
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to read file: {}", e)))?;

        if data.len() as u64 > config.max_file_size {
            return Err(ApiError::validation_error(format!(
                "File too large. Maximum size: {}",
                format_file_size(config.max_file_size)
            )));
        }

        // Subfolder from the MIME lookup table, filename from a fresh UUID
        let subfolder = subfolder_for_mime(&content_type);
        let ext = get_extension(&filename, &content_type);
        let stored_name = format!("{}.{}", Uuid::new_v4(), ext);
        let relative = format!("{}/{}", subfolder, stored_name);

        let dir = config.path.join(subfolder);
        ensure_dir(&dir).await?;

        let file_path = dir.join(&stored_name);
        fs::write(&file_path, &data)
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to save file: {}", e)))?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: format!("/uploads/{}", relative),
                stored_path: relative,
                original_name: filename,
                content_type,
                size: data.len() as u64,
                size_formatted: format_file_size(data.len() as u64),
            }),
        ));
    }

    Err(ApiError::validation_error("No file provided"))
}

/// Request body for attaching a stored upload to an owner
#[derive(Debug, Deserialize)]
pub struct AttachRequest {
    pub stored_path: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
}

/// POST /api/v1/admin/projects/{id}/files
pub async fn attach_to_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<AttachRequest>,
) -> Result<(StatusCode, Json<Attachment>), ApiError> {
    state
        .project_service
        .get_by_id(id)
        .await
        .map_err(|_| ApiError::not_found("Project not found"))?;

    attach(&state, user, AttachmentOwner::Project, id, body).await
}

/// POST /api/v1/admin/posts/{id}/files
pub async fn attach_to_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<AttachRequest>,
) -> Result<(StatusCode, Json<Attachment>), ApiError> {
    state
        .post_service
        .get_by_id(id)
        .await
        .map_err(|_| ApiError::not_found("Post not found"))?;

    attach(&state, user, AttachmentOwner::Post, id, body).await
}

async fn attach(
    state: &AppState,
    _user: AuthenticatedUser,
    owner: AttachmentOwner,
    owner_id: i64,
    body: AttachRequest,
) -> Result<(StatusCode, Json<Attachment>), ApiError> {
    if body.stored_path.contains("..") {
        return Err(ApiError::validation_error("Invalid stored path"));
    }
    if !state.upload_config.path.join(&body.stored_path).exists() {
        return Err(ApiError::validation_error("Stored file does not exist"));
    }

    let attachment = state
        .attachment_repo
        .create(&NewAttachment {
            owner,
            owner_id,
            stored_path: body.stored_path,
            original_name: body.original_name,
            content_type: body.content_type,
            size_bytes: body.size,
        })
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(attachment)))
}

/// DELETE /api/v1/admin/files/{owner}/{id} - Remove an attachment row and
/// its file on disk
pub async fn delete_attachment(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path((owner, id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    let owner: AttachmentOwner = owner
        .parse()
        .map_err(|_| ApiError::validation_error("Invalid attachment owner"))?;

    let deleted = state
        .attachment_repo
        .delete(owner, id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Attachment not found"))?;

    // Disk cleanup is best-effort; the row is already gone
    let disk_path = state.upload_config.path.join(&deleted.stored_path);
    if let Err(e) = fs::remove_file(&disk_path).await {
        tracing::debug!("Failed to remove attachment file {:?}: {}", disk_path, e);
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subfolder_lookup_images() {
        assert_eq!(subfolder_for_mime("image/png"), "images");
        assert_eq!(subfolder_for_mime("image/svg+xml"), "images");
    }

    #[test]
    fn test_subfolder_lookup_documents_and_archives() {
        assert_eq!(subfolder_for_mime("application/pdf"), "documents");
        assert_eq!(subfolder_for_mime("application/zip"), "archives");
        assert_eq!(subfolder_for_mime("video/mp4"), "videos");
        assert_eq!(subfolder_for_mime("audio/mpeg"), "audio");
    }

    #[test]
    fn test_subfolder_lookup_unknown_is_misc() {
        assert_eq!(subfolder_for_mime("application/octet-stream"), "misc");
        assert_eq!(subfolder_for_mime(""), "misc");
    }

    #[test]
    fn test_format_file_size_bytes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1023), "1023 B");
    }

    #[test]
    fn test_format_file_size_units() {
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn test_get_extension_from_filename() {
        assert_eq!(get_extension("report.PDF", "application/pdf"), "pdf");
        assert_eq!(get_extension("archive.tar.gz", "application/gzip"), "gz");
    }

    #[test]
    fn test_get_extension_falls_back_to_mime() {
        assert_eq!(get_extension("noext", "image/png"), "png");
        assert_eq!(get_extension("noext", "application/unknown"), "bin");
    }
}

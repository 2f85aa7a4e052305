//! Comment API endpoints

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::{CommentStatus, CommentWithMeta, CreateCommentInput, TargetKind};
use crate::services::comment::CommentServiceError;
use crate::services::generate_fingerprint;

fn map_error(e: CommentServiceError) -> ApiError {
    match e {
        CommentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        CommentServiceError::NotFound => ApiError::not_found("Comment not found"),
        CommentServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// GET /api/v1/comments/{kind}/{id} - Approved comments for a target
pub async fn get_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((kind, target_id)): Path<(String, i64)>,
) -> Result<Json<Vec<CommentWithMeta>>, ApiError> {
    let target_kind: TargetKind = kind
        .parse()
        .map_err(|_| ApiError::validation_error("Invalid target kind"))?;

    let fingerprint = extract_fingerprint(&headers);
    let comments = state
        .comment_service
        .get_by_target(target_kind, target_id, fingerprint.as_deref())
        .await
        .map_err(map_error)?;

    Ok(Json(comments))
}

/// POST /api/v1/comments - Create a comment (guests allowed)
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateCommentInput>,
) -> Result<(StatusCode, Json<crate::models::Comment>), ApiError> {
    let user_id = get_user_id_from_headers(&state, &headers).await;

    let ip = extract_ip(&headers);
    let ua = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let comment = state
        .comment_service
        .create(input, user_id, ip, ua)
        .await
        .map_err(map_error)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

// ============================================================================
// Admin endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/v1/admin/comments/pending - Moderation queue
pub async fn list_pending(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<PendingQuery>,
) -> Result<Json<PagedResult<CommentWithMeta>>, ApiError> {
    let params = ListParams::new(query.page.unwrap_or(1), query.per_page.unwrap_or(20));
    let result = state
        .comment_service
        .list_pending(&params)
        .await
        .map_err(map_error)?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: CommentStatus,
}

/// PUT /api/v1/admin/comments/{id}/status - Approve or mark spam
pub async fn set_comment_status(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<SetStatusRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .comment_service
        .set_status(id, body.status)
        .await
        .map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.comment_service.delete(id).await.map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Header helpers (shared with the interactions module)
// ============================================================================

/// Extract client IP from proxy headers
pub(crate) fn extract_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

/// Derive an anonymous fingerprint from IP and user agent
pub(crate) fn extract_fingerprint(headers: &HeaderMap) -> Option<String> {
    let ip = extract_ip(headers)?;
    let ua = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    Some(generate_fingerprint(&ip, ua))
}

/// Resolve the session (cookie or bearer) to a user id, if any
pub(crate) async fn get_user_id_from_headers(state: &AppState, headers: &HeaderMap) -> Option<i64> {
    let token = if let Some(auth) = headers.get("authorization") {
        auth.to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(|t| t.to_string())
    } else {
        headers
            .get("cookie")?
            .to_str()
            .ok()?
            .split(';')
            .find_map(|c| c.trim().strip_prefix("session=").map(|t| t.to_string()))
    }?;

    let user = state.user_service.validate_session(&token).await.ok()??;
    Some(user.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ip_from_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "1.2.3.4, 10.0.0.1".parse().unwrap());
        assert_eq!(extract_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn test_extract_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "5.6.7.8".parse().unwrap());
        assert_eq!(extract_ip(&headers), Some("5.6.7.8".to_string()));
    }

    #[test]
    fn test_fingerprint_requires_ip() {
        let headers = HeaderMap::new();
        assert!(extract_fingerprint(&headers).is_none());
    }

    #[test]
    fn test_fingerprint_stable_for_same_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "5.6.7.8".parse().unwrap());
        headers.insert("user-agent", "agent".parse().unwrap());
        assert_eq!(extract_fingerprint(&headers), extract_fingerprint(&headers));
    }
}

//! Like and favorite API endpoints

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::comments::{extract_fingerprint, get_user_id_from_headers};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Favorite, TargetKind};
use crate::services::ToggleOutcome;

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    pub target_kind: TargetKind,
    pub target_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub active: bool,
}

/// Resolve the caller's like identity: user id when logged in, otherwise
/// an IP+UA fingerprint.
async fn like_identity(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(Option<i64>, Option<String>), ApiError> {
    let user_id = get_user_id_from_headers(state, headers).await;
    let fingerprint = if user_id.is_none() {
        extract_fingerprint(headers)
    } else {
        None
    };

    if user_id.is_none() && fingerprint.is_none() {
        return Err(ApiError::validation_error("Unable to identify caller"));
    }
    Ok((user_id, fingerprint))
}

/// POST /api/v1/likes/toggle - Toggle a like for the caller
pub async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TargetRequest>,
) -> Result<Json<ToggleOutcome>, ApiError> {
    let (user_id, fingerprint) = like_identity(&state, &headers).await?;

    let outcome = state
        .interaction_service
        .toggle_like(body.target_kind, body.target_id, user_id, fingerprint)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(outcome))
}

/// GET /api/v1/likes/status - Whether the caller has liked a target
pub async fn like_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TargetRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user_id = get_user_id_from_headers(&state, &headers).await;
    let fingerprint = if user_id.is_none() {
        extract_fingerprint(&headers)
    } else {
        None
    };

    let active = state
        .interaction_service
        .is_liked(query.target_kind, query.target_id, user_id, fingerprint.as_deref())
        .await
        .unwrap_or(false);

    Ok(Json(StatusResponse { active }))
}

/// POST /api/v1/favorites/toggle - Toggle a favorite (requires login)
pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<TargetRequest>,
) -> Result<Json<ToggleOutcome>, ApiError> {
    let outcome = state
        .interaction_service
        .toggle_favorite(body.target_kind, body.target_id, user.0.id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(outcome))
}

/// GET /api/v1/favorites/status - Whether the user has favorited a target
pub async fn favorite_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<TargetRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let active = state
        .interaction_service
        .is_favorited(query.target_kind, query.target_id, user.0.id)
        .await
        .unwrap_or(false);

    Ok(Json(StatusResponse { active }))
}

/// GET /api/v1/favorites/mine - The caller's favorites
pub async fn list_my_favorites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Favorite>>, ApiError> {
    let favorites = state
        .interaction_service
        .list_favorites(user.0.id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(favorites))
}

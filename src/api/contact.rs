//! Contact and guestbook API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::{
    ContactMessage, CreateContactInput, CreateGuestbookInput, GuestbookMessage,
};
use crate::services::contact::ContactServiceError;

fn map_error(e: ContactServiceError) -> ApiError {
    match e {
        ContactServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        ContactServiceError::NotFound => ApiError::not_found("Message not found"),
        ContactServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// POST /api/v1/contact - Submit the contact form
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(input): Json<CreateContactInput>,
) -> Result<(StatusCode, Json<ContactMessage>), ApiError> {
    let message = state
        .contact_service
        .submit_contact(input)
        .await
        .map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/v1/guestbook - Public guestbook wall
pub async fn list_guestbook(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<GuestbookMessage>>, ApiError> {
    let params = ListParams::new(query.page.unwrap_or(1), query.per_page.unwrap_or(20));
    let result = state
        .contact_service
        .list_guestbook(&params)
        .await
        .map_err(map_error)?;
    Ok(Json(result))
}

/// POST /api/v1/guestbook - Sign the guestbook
pub async fn sign_guestbook(
    State(state): State<AppState>,
    Json(input): Json<CreateGuestbookInput>,
) -> Result<(StatusCode, Json<GuestbookMessage>), ApiError> {
    let message = state
        .contact_service
        .sign_guestbook(input)
        .await
        .map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(message)))
}

// ============================================================================
// Admin endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    #[serde(default)]
    pub unread_only: bool,
}

/// GET /api/v1/admin/contact - Contact inbox
pub async fn list_contact(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<InboxQuery>,
) -> Result<Json<PagedResult<ContactMessage>>, ApiError> {
    let params = ListParams::new(query.page.unwrap_or(1), query.per_page.unwrap_or(20));
    let result = state
        .contact_service
        .list_contact(query.unread_only, &params)
        .await
        .map_err(map_error)?;
    Ok(Json(result))
}

/// PUT /api/v1/admin/contact/{id}/read - Mark a contact message read
pub async fn mark_contact_read(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.contact_service.mark_read(id).await.map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/contact/{id}
pub async fn delete_contact(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .contact_service
        .delete_contact(id)
        .await
        .map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/guestbook/{id}
pub async fn delete_guestbook(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .contact_service
        .delete_guestbook(id)
        .await
        .map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

//! Blog post API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::post::{CreatePostInput, Post, UpdatePostInput};
use crate::models::{Attachment, AttachmentOwner};
use crate::services::post::PostServiceError;

fn map_error(e: PostServiceError) -> ApiError {
    match e {
        PostServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        PostServiceError::SlugExists(slug) => {
            ApiError::conflict(format!("Slug '{}' is already in use", slug))
        }
        PostServiceError::NotFound => ApiError::not_found("Post not found"),
        PostServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// Query parameters for the public post listing
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub tag: Option<String>,
}

/// GET /api/v1/posts - Public listing of published posts
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PagedResult<Post>>, ApiError> {
    let params = ListParams::new(query.page.unwrap_or(1), query.per_page.unwrap_or(10));
    let result = state
        .post_service
        .list_published(query.tag, &params)
        .await
        .map_err(map_error)?;
    Ok(Json(result))
}

/// GET /api/v1/posts/{slug} - Published post detail with best-effort view count
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .post_service
        .get_published_by_slug(&slug)
        .await
        .map_err(map_error)?;

    state.post_service.record_view(post.id).await;

    Ok(Json(post))
}

// ============================================================================
// Admin endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/v1/admin/posts - All posts including drafts
pub async fn admin_list_posts(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<PagedResult<Post>>, ApiError> {
    let params = ListParams::new(query.page.unwrap_or(1), query.per_page.unwrap_or(20));
    let result = state.post_service.list_all(&params).await.map_err(map_error)?;
    Ok(Json(result))
}

/// GET /api/v1/admin/posts/{id}
pub async fn admin_get_post(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    let post = state.post_service.get_by_id(id).await.map_err(map_error)?;
    Ok(Json(post))
}

/// POST /api/v1/admin/posts
pub async fn create_post(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state.post_service.create(input).await.map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/v1/admin/posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePostInput>,
) -> Result<Json<Post>, ApiError> {
    let post = state.post_service.update(id, input).await.map_err(map_error)?;
    Ok(Json(post))
}

/// DELETE /api/v1/admin/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.post_service.delete(id).await.map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/posts/{id}/files - Attachments of a post
pub async fn list_post_files(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Attachment>>, ApiError> {
    state.post_service.get_by_id(id).await.map_err(map_error)?;

    let files = state
        .attachment_repo
        .list_by_owner(AttachmentOwner::Post, id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    Ok(Json(files))
}

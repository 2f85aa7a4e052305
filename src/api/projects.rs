//! Project API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::pagination::{ListParams, PagedResult};
use crate::models::project::{CreateProjectInput, Project, UpdateProjectInput};
use crate::models::{Attachment, AttachmentOwner};
use crate::services::project::ProjectServiceError;

fn map_error(e: ProjectServiceError) -> ApiError {
    match e {
        ProjectServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        ProjectServiceError::SlugExists(slug) => {
            ApiError::conflict(format!("Slug '{}' is already in use", slug))
        }
        ProjectServiceError::NotFound => ApiError::not_found("Project not found"),
        ProjectServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// Query parameters for the public project listing
#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub featured: Option<bool>,
    pub tech: Option<String>,
}

/// GET /api/v1/projects - Public listing of published projects
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<PagedResult<Project>>, ApiError> {
    let params = ListParams::new(query.page.unwrap_or(1), query.per_page.unwrap_or(10));
    let result = state
        .project_service
        .list_published(query.featured, query.tech, &params)
        .await
        .map_err(map_error)?;
    Ok(Json(result))
}

/// GET /api/v1/projects/{slug} - Published project detail
///
/// The view counter is incremented best-effort; a failed increment never
/// fails the request.
pub async fn get_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .project_service
        .get_published_by_slug(&slug)
        .await
        .map_err(map_error)?;

    state.project_service.record_view(project.id).await;

    Ok(Json(project))
}

// ============================================================================
// Admin endpoints
// ============================================================================

/// Query parameters for the admin project listing
#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/v1/admin/projects - All projects including drafts
pub async fn admin_list_projects(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<PagedResult<Project>>, ApiError> {
    let params = ListParams::new(query.page.unwrap_or(1), query.per_page.unwrap_or(20));
    let result = state.project_service.list_all(&params).await.map_err(map_error)?;
    Ok(Json(result))
}

/// GET /api/v1/admin/projects/{id}
pub async fn admin_get_project(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ApiError> {
    let project = state.project_service.get_by_id(id).await.map_err(map_error)?;
    Ok(Json(project))
}

/// POST /api/v1/admin/projects
pub async fn create_project(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.project_service.create(input).await.map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/v1/admin/projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateProjectInput>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .project_service
        .update(id, input)
        .await
        .map_err(map_error)?;
    Ok(Json(project))
}

/// DELETE /api/v1/admin/projects/{id}
pub async fn delete_project(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.project_service.delete(id).await.map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/projects/{id}/files - Attachments of a project
pub async fn list_project_files(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Attachment>>, ApiError> {
    // 404 for a missing project instead of an empty list
    state.project_service.get_by_id(id).await.map_err(map_error)?;

    let files = state
        .attachment_repo
        .list_by_owner(AttachmentOwner::Project, id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    Ok(Json(files))
}

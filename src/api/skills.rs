//! Skill API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateSkillInput, Skill, UpdateSkillInput};
use crate::services::skill::SkillServiceError;

fn map_error(e: SkillServiceError) -> ApiError {
    match e {
        SkillServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        SkillServiceError::NotFound => ApiError::not_found("Skill not found"),
        SkillServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// GET /api/v1/skills - Public skill listing
pub async fn list_skills(State(state): State<AppState>) -> Result<Json<Vec<Skill>>, ApiError> {
    let skills = state.skill_service.list().await.map_err(map_error)?;
    Ok(Json(skills))
}

/// POST /api/v1/admin/skills
pub async fn create_skill(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CreateSkillInput>,
) -> Result<(StatusCode, Json<Skill>), ApiError> {
    let skill = state.skill_service.create(input).await.map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(skill)))
}

/// PUT /api/v1/admin/skills/{id}
pub async fn update_skill(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateSkillInput>,
) -> Result<Json<Skill>, ApiError> {
    let skill = state.skill_service.update(id, input).await.map_err(map_error)?;
    Ok(Json(skill))
}

/// DELETE /api/v1/admin/skills/{id}
pub async fn delete_skill(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.skill_service.delete(id).await.map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

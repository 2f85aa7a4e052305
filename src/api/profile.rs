//! Profile API endpoints

use axum::{extract::State, Json};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Profile, UpdateProfileInput};
use crate::services::profile::ProfileServiceError;

fn map_error(e: ProfileServiceError) -> ApiError {
    match e {
        ProfileServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        ProfileServiceError::NotFound => ApiError::not_found("Profile not set up"),
        ProfileServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// GET /api/v1/profile - Public profile
pub async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>, ApiError> {
    let profile = state.profile_service.get().await.map_err(map_error)?;
    Ok(Json(profile))
}

/// PUT /api/v1/admin/profile - Create or replace the profile
pub async fn update_profile(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<UpdateProfileInput>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state.profile_service.update(input).await.map_err(map_error)?;
    Ok(Json(profile))
}

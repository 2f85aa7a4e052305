//! Authentication API endpoints
//!
//! - POST /api/v1/auth/register - User registration (first user is admin)
//! - POST /api/v1/auth/login - User login
//! - POST /api/v1/auth/logout - User logout
//! - GET /api/v1/auth/me - Current user
//! - PUT /api/v1/auth/password - Change password

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::user::{LoginInput, RegisterInput, UserServiceError};

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Request body for password change
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Response for user info
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl From<crate::models::User> for UserResponse {
    fn from(user: crate::models::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
        .route("/password", put(change_password))
}

/// Build Set-Cookie header for a session token
fn session_cookie(token: &str) -> HeaderValue {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token,
        7 * 24 * 60 * 60
    );
    HeaderValue::from_str(&cookie).expect("cookie value is always valid ASCII")
}

fn map_user_error(e: UserServiceError) -> ApiError {
    match e {
        UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        UserServiceError::UserExists(msg) => ApiError::conflict(msg),
        UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
        UserServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let password = body.password.clone();
    let input = RegisterInput::new(body.username, body.email, body.password);

    let user = state.user_service.register(input).await.map_err(map_user_error)?;

    // Log the new user straight in
    let session = state
        .user_service
        .login(LoginInput::new(&user.username, &password))
        .await
        .map_err(map_user_error)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&session.id));

    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .user_service
        .login(LoginInput::new(body.username_or_email, body.password))
        .await
        .map_err(map_user_error)?;

    let user = state
        .user_service
        .validate_session(&session.id)
        .await
        .map_err(map_user_error)?
        .ok_or_else(|| ApiError::internal_error("Session vanished after login"))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&session.id));

    Ok((
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    // Invalidate whichever token authenticated this request
    if let Some(token) = extract_token(&headers) {
        state
            .user_service
            .logout(&token)
            .await
            .map_err(map_user_error)?;
    }

    // Expire the cookie client-side too
    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );

    Ok((response_headers, StatusCode::NO_CONTENT))
}

/// GET /api/v1/auth/me
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}

/// PUT /api/v1/auth/password
async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .user_service
        .change_password(&user.0, &body.current_password, &body.new_password)
        .await
        .map_err(map_user_error)?;

    Ok(StatusCode::NO_CONTENT)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth) = auth.to_str() {
            if let Some(token) = auth.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session=").map(|t| t.to_string()))
}

//! API layer - HTTP handlers and routing
//!
//! All HTTP endpoints for the Vitrine portfolio system:
//! - Public content endpoints (profile, skills, projects, posts, comments,
//!   likes, guestbook, contact, downloads)
//! - Authenticated endpoints (favorites, account)
//! - Admin endpoints (content CRUD, moderation, inbox, uploads, dashboard)

pub mod admin;
pub mod auth;
pub mod comments;
pub mod contact;
pub mod files;
pub mod interactions;
pub mod middleware;
pub mod posts;
pub mod profile;
pub mod projects;
pub mod skills;
pub mod upload;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .route("/admin/dashboard", get(admin::get_dashboard))
        .route("/admin/stats", get(admin::get_system_stats))
        // Project management
        .route("/admin/projects", get(projects::admin_list_projects))
        .route("/admin/projects", post(projects::create_project))
        .route("/admin/projects/{id}", get(projects::admin_get_project))
        .route("/admin/projects/{id}", put(projects::update_project))
        .route("/admin/projects/{id}", delete(projects::delete_project))
        .route("/admin/projects/{id}/files", get(projects::list_project_files))
        .route("/admin/projects/{id}/files", post(upload::attach_to_project))
        // Post management
        .route("/admin/posts", get(posts::admin_list_posts))
        .route("/admin/posts", post(posts::create_post))
        .route("/admin/posts/{id}", get(posts::admin_get_post))
        .route("/admin/posts/{id}", put(posts::update_post))
        .route("/admin/posts/{id}", delete(posts::delete_post))
        .route("/admin/posts/{id}/files", get(posts::list_post_files))
        .route("/admin/posts/{id}/files", post(upload::attach_to_post))
        // Comment moderation
        .route("/admin/comments/pending", get(comments::list_pending))
        .route("/admin/comments/{id}/status", put(comments::set_comment_status))
        .route("/admin/comments/{id}", delete(comments::delete_comment))
        // Contact inbox and guestbook
        .route("/admin/contact", get(contact::list_contact))
        .route("/admin/contact/{id}/read", put(contact::mark_contact_read))
        .route("/admin/contact/{id}", delete(contact::delete_contact))
        .route("/admin/guestbook/{id}", delete(contact::delete_guestbook))
        // Skills and profile
        .route("/admin/skills", post(skills::create_skill))
        .route("/admin/skills/{id}", put(skills::update_skill))
        .route("/admin/skills/{id}", delete(skills::delete_skill))
        .route("/admin/profile", put(profile::update_profile))
        // Uploads and attachments
        .route("/admin/uploads", post(upload::upload_file))
        .route("/admin/files/{owner}/{id}", delete(upload::delete_attachment))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .route("/favorites/toggle", post(interactions::toggle_favorite))
        .route("/favorites/status", get(interactions::favorite_status))
        .route("/favorites/mine", get(interactions::list_my_favorites))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/profile", get(profile::get_profile))
        .route("/skills", get(skills::list_skills))
        .route("/projects", get(projects::list_projects))
        .route("/projects/{slug}", get(projects::get_project))
        .route("/posts", get(posts::list_posts))
        .route("/posts/{slug}", get(posts::get_post))
        .route("/comments/{kind}/{id}", get(comments::get_comments))
        .route("/comments", post(comments::create_comment))
        .route("/likes/toggle", post(interactions::toggle_like))
        .route("/likes/status", get(interactions::like_status))
        .route("/contact", post(contact::submit_contact))
        .route("/guestbook", get(contact::list_guestbook))
        .route("/guestbook", post(contact::sign_guestbook))
        .route("/files/{owner}/{id}", get(files::list_attachments))
        .route("/files/{owner}/{id}/download", get(files::download_attachment))
        .nest("/auth", auth::public_router())
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let uploads_dir = state.upload_config.path.clone();

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        // Raw uploaded files (images referenced by content)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}

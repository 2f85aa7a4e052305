//! Admin API endpoints
//!
//! Dashboard aggregates and process/system stats.

use axum::{extract::State, Json};
use serde::Serialize;
use std::process;
use sysinfo::{Pid, System};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::upload::format_file_size;
use crate::models::{CommentStatus, PostStatus, ProjectStatus};

/// App version constant - update when releasing
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response for dashboard aggregates
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_projects: i64,
    pub published_projects: i64,
    pub total_posts: i64,
    pub published_posts: i64,
    pub total_comments: i64,
    pub pending_comments: i64,
    pub unread_contact_messages: i64,
    pub guestbook_messages: i64,
    pub total_skills: i64,
    pub total_views: i64,
    pub total_likes: i64,
}

/// GET /api/v1/admin/dashboard - Aggregate counts for the admin home
pub async fn get_dashboard(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let internal = |e: anyhow::Error| ApiError::internal_error(e.to_string());

    let total_projects = state.project_repo.count(None).await.map_err(internal)?;
    let published_projects = state
        .project_repo
        .count(Some(ProjectStatus::Published))
        .await
        .map_err(internal)?;
    let total_posts = state.post_repo.count(None).await.map_err(internal)?;
    let published_posts = state
        .post_repo
        .count(Some(PostStatus::Published))
        .await
        .map_err(internal)?;
    let total_comments = state.comment_repo.count(None).await.map_err(internal)?;
    let pending_comments = state
        .comment_repo
        .count(Some(CommentStatus::Pending))
        .await
        .map_err(internal)?;
    let unread_contact_messages = state.contact_repo.count_unread().await.map_err(internal)?;
    let guestbook_messages = state.contact_repo.count_guestbook().await.map_err(internal)?;
    let total_skills = state.skill_repo.count().await.map_err(internal)?;
    let total_views = state.project_repo.total_views().await.map_err(internal)?
        + state.post_repo.total_views().await.map_err(internal)?;
    let total_likes = state.interaction_repo.total_likes().await.map_err(internal)?;

    Ok(Json(DashboardResponse {
        total_projects,
        published_projects,
        total_posts,
        published_posts,
        total_comments,
        pending_comments,
        unread_contact_messages,
        guestbook_messages,
        total_skills,
        total_views,
        total_likes,
    }))
}

/// Response for system stats (CPU, memory usage)
#[derive(Debug, Serialize)]
pub struct SystemStatsResponse {
    pub version: String,
    /// Process memory usage in bytes
    pub memory_bytes: u64,
    /// Process memory usage formatted (e.g. "45.2 MB")
    pub memory_formatted: String,
    pub system_total_memory: u64,
    pub system_used_memory: u64,
    pub os_name: String,
    pub uptime_seconds: u64,
    pub uptime_formatted: String,
    pub total_requests: u64,
    pub avg_response_time_ms: f64,
}

/// GET /api/v1/admin/stats - Process and system stats
pub async fn get_system_stats(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<SystemStatsResponse>, ApiError> {
    let mut system = System::new_all();
    system.refresh_all();

    let pid = Pid::from_u32(process::id());
    let memory_bytes = system
        .process(pid)
        .map(|p| p.memory())
        .unwrap_or(0);

    let uptime_seconds = state.request_stats.uptime_seconds();

    Ok(Json(SystemStatsResponse {
        version: APP_VERSION.to_string(),
        memory_bytes,
        memory_formatted: format_file_size(memory_bytes),
        system_total_memory: system.total_memory(),
        system_used_memory: system.used_memory(),
        os_name: System::name().unwrap_or_else(|| "unknown".to_string()),
        uptime_seconds,
        uptime_formatted: format_uptime(uptime_seconds),
        total_requests: state.request_stats.total_requests(),
        avg_response_time_ms: state.request_stats.avg_response_time_us() / 1000.0,
    }))
}

/// Format seconds as "2d 3h 15m" / "3h 15m" / "15m 42s"
fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(42), "0m 42s");
        assert_eq!(format_uptime(3600 + 900), "1h 15m");
        assert_eq!(format_uptime(2 * 86400 + 3 * 3600 + 60), "2d 3h 1m");
    }
}

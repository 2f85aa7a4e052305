//! Vitrine - A personal portfolio and content management backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitrine::{
    api::{self, AppState, RequestStats},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxAttachmentRepository, SqlxCommentRepository, SqlxContactRepository,
            SqlxInteractionRepository, SqlxPostRepository, SqlxProfileRepository,
            SqlxProjectRepository, SqlxSessionRepository, SqlxSkillRepository,
            SqlxUserRepository,
        },
    },
    services::{
        CommentService, ContactService, InteractionService, PostService, ProfileService,
        ProjectService, SkillService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Vitrine portfolio system...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let profile_repo = SqlxProfileRepository::boxed(pool.clone());
    let skill_repo = SqlxSkillRepository::boxed(pool.clone());
    let project_repo = SqlxProjectRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());
    let interaction_repo = SqlxInteractionRepository::boxed(pool.clone());
    let contact_repo = SqlxContactRepository::boxed(pool.clone());
    let attachment_repo = SqlxAttachmentRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo, session_repo));
    let profile_service = Arc::new(ProfileService::new(profile_repo));
    let skill_service = Arc::new(SkillService::new(skill_repo.clone()));
    let project_service = Arc::new(ProjectService::new(project_repo.clone()));
    let post_service = Arc::new(PostService::new(post_repo.clone()));
    let comment_service = Arc::new(CommentService::new(
        comment_repo.clone(),
        config.comments.moderated,
    ));
    let interaction_service = Arc::new(InteractionService::new(interaction_repo.clone()));
    let contact_service = Arc::new(ContactService::new(contact_repo.clone()));

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        user_service: user_service.clone(),
        profile_service,
        skill_service,
        project_service,
        post_service,
        comment_service,
        interaction_service,
        contact_service,
        project_repo,
        post_repo,
        comment_repo,
        skill_repo,
        contact_repo,
        interaction_repo,
        attachment_repo,
        upload_config: Arc::new(config.upload.clone()),
        request_stats: Arc::new(RequestStats::new()),
    };

    // Periodic session cleanup (runs every hour)
    {
        let user_service = user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match user_service.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("Removed {} expired session(s)", n),
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

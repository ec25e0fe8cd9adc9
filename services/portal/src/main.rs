use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod authz;
mod error;
mod jwt;
mod lifecycle;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod team;
mod validation;

use common::database::{DatabaseConfig, init_pool};

use crate::jwt::{JwtConfig, JwtService};
use crate::repositories::{CommentRepository, ProjectRepository, UserRepository};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting portal service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply schema migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(common::error::DatabaseError::Migration)?;

    info!("Portal service initialized successfully");

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    // Initialize repositories
    let user_repository = UserRepository::new(pool.clone());
    let project_repository = ProjectRepository::new(pool.clone());
    let comment_repository = CommentRepository::new(pool.clone());

    let app_state = AppState {
        db_pool: pool,
        jwt_service,
        user_repository,
        project_repository,
        comment_repository,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr =
        std::env::var("PORTAL_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Portal service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

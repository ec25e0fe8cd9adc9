//! Application state shared across handlers

use sqlx::PgPool;

use crate::jwt::JwtService;
use crate::repositories::{CommentRepository, ProjectRepository, UserRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub project_repository: ProjectRepository,
    pub comment_repository: CommentRepository,
}

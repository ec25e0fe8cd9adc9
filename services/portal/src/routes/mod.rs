//! Portal service routes

use axum::{
    Json, Router,
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use serde_json::json;

use crate::middleware::auth_middleware;
use crate::state::AppState;

mod admin;
mod project;
mod user;

/// Create the router for the portal service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/user/profile", get(user::profile))
        .route("/user", get(user::list_active_users))
        .route("/project", post(project::create_project))
        .route("/project", get(project::list_projects))
        .route("/project/comment", post(project::create_comment))
        .route("/project/comment/:id", delete(project::delete_comment))
        .route("/project/comments", get(project::list_comments))
        .route("/project/:id", get(project::project_detail))
        .route("/project/:id", patch(project::update_status))
        .route("/project/:id/members", post(project::add_member))
        .route(
            "/project/:id/members/:student_id",
            delete(project::remove_member),
        )
        .route("/project/:id/mentor", put(project::set_mentor))
        .route("/admin/projects", get(admin::list_projects))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/user/:id", patch(admin::update_user))
        .route("/admin/project/:id", patch(admin::update_project))
        .route("/admin/project/:id", delete(admin::delete_project))
        .route("/admin/comment/:id", patch(admin::update_comment))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/user/register", post(user::register))
        .route("/user/login", post(user::login))
        .route("/user/mentor", get(user::find_mentor))
        .route("/user/student", get(user::find_student))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "portal-service"
    }))
}

//! Administrative handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::authz::{self, Action, AuthUser, Relation};
use crate::error::ApiResult;
use crate::models::{UpdateComment, UpdateProject, UpdateUser};
use crate::state::AppState;

/// All projects, excluding soft-deleted ones
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::AdminRead, Relation::None)?;

    let projects = state.project_repository.list_all().await?;
    Ok(Json(projects))
}

/// All users, banned included
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::AdminRead, Relation::None)?;

    let users = state.user_repository.list_all().await?;
    Ok(Json(users))
}

/// Overwrite user fields; role and status accept any value unconditionally
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUser>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::ManageUsers, Relation::None)?;

    let user = state.user_repository.update(id, &payload).await?;

    info!("User {} updated by admin {}", id, auth.id);

    Ok(Json(user))
}

/// Edit project fields; an included status change is validated against the
/// lifecycle table
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProject>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::UpdateFields, Relation::None)?;

    let project = state.project_repository.update_fields(id, &payload).await?;
    Ok(Json(project))
}

/// Soft-delete a project; the row and its roster are retained
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::DeleteProject, Relation::None)?;

    state.project_repository.soft_delete(id).await?;

    info!("Project {} deleted by admin {}", id, auth.id);

    Ok(Json(json!({"message": "Project deleted successfully"})))
}

/// Overwrite comment fields without an ownership check; the administrative
/// channel, distinct from user-initiated deletion
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateComment>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::UpdateFields, Relation::None)?;

    let comment = state.comment_repository.update(id, &payload).await?;
    Ok(Json(comment))
}

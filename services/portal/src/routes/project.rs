//! Project, team, and comment handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::authz::{self, Action, AuthUser, Relation};
use crate::error::{ApiError, ApiResult};
use crate::models::{NewComment, NewProject, Role, StatusUpdate, UpdateProject};
use crate::state::AppState;

/// Query parameters for the comment listing
#[derive(Deserialize)]
pub struct CommentQuery {
    pub projectid: Option<Uuid>,
}

/// Payload for adding a teammate
#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub student_id: Uuid,
}

/// Payload for assigning or clearing the mentor
#[derive(Deserialize)]
pub struct SetMentorRequest {
    pub mentor_id: Option<Uuid>,
}

/// Create a new project; the caller becomes the team leader
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<NewProject>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::CreateProject, Relation::None)?;

    if payload.title.trim().is_empty() {
        return Err(ApiError::InvalidArgument("Title is required".to_string()));
    }

    let project = state.project_repository.create(&payload, auth.id).await?;

    info!("Project created: {} by {}", project.id, auth.id);

    Ok((StatusCode::CREATED, Json(project)))
}

/// List projects scoped to the caller's role
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let projects = match auth.role {
        Role::Student => state.project_repository.list_for_student(auth.id).await?,
        Role::Mentor => state.project_repository.list_for_mentor(auth.id).await?,
        // Admins use the dedicated /admin/projects listing
        Role::Admin => return Err(ApiError::Forbidden),
    };

    Ok(Json(projects))
}

/// Project detail: project, roster, and mentor identity
pub async fn project_detail(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::ReadProject, Relation::None)?;

    let detail = state.project_repository.detail(id).await?;
    Ok(Json(detail))
}

/// Transition a project's lifecycle status
///
/// Admins may trigger any edge in the transition table; a mentor only the
/// mentor-authorized edges, and only on projects assigned to them. The
/// mentor path never reveals whether a project exists.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdate>,
) -> ApiResult<impl IntoResponse> {
    // The gate filters roles up front; for mentors the assignment claim is
    // then verified against the store by the mentor-scoped predicate below.
    let presumed_relation = if auth.role == Role::Mentor {
        Relation::AssignedMentor
    } else {
        Relation::None
    };
    authz::can_perform(&auth, Action::UpdateStatus, presumed_relation)?;

    let project = match auth.role {
        Role::Mentor => {
            state
                .project_repository
                .update_status_for_mentor(id, auth.id, payload.status)
                .await?
        }
        _ => {
            let update = UpdateProject {
                status: Some(payload.status),
                ..Default::default()
            };
            state.project_repository.update_fields(id, &update).await?
        }
    };

    Ok(Json(project))
}

/// Add a comment to a project's thread
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<NewComment>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::CreateComment, Relation::None)?;

    if payload.content.trim().is_empty() {
        return Err(ApiError::InvalidArgument("Content is required".to_string()));
    }

    let comment = state.comment_repository.create(auth.id, &payload).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Active comments for a project
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<CommentQuery>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::ReadProject, Relation::None)?;

    let project_id = query
        .projectid
        .ok_or_else(|| ApiError::InvalidArgument("projectid query parameter is required".to_string()))?;

    let comments = state.comment_repository.list_for_project(project_id).await?;
    Ok(Json(comments))
}

/// Soft-delete a comment; author-only, with the conflated failure shape
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let comment = state
        .comment_repository
        .find_by_id(id)
        .await?
        .ok_or_else(authz::comment_scope_error)?;

    let relation = if comment.author_id == auth.id {
        Relation::CommentAuthor
    } else {
        Relation::None
    };
    authz::can_perform(&auth, Action::DeleteComment, relation)?;

    state.comment_repository.soft_delete(id, auth.id).await?;

    Ok(Json(json!({"message": "Comment deleted successfully"})))
}

/// Add a teammate to a project roster
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::UpdateFields, Relation::None)?;

    let member = state
        .project_repository
        .add_member(id, payload.student_id)
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// Remove a teammate from a project roster
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::UpdateFields, Relation::None)?;

    state.project_repository.remove_member(id, student_id).await?;

    Ok(Json(json!({"message": "Member removed successfully"})))
}

/// Assign or clear a project's mentor
pub async fn set_mentor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetMentorRequest>,
) -> ApiResult<impl IntoResponse> {
    authz::can_perform(&auth, Action::UpdateFields, Relation::None)?;

    let project = state
        .project_repository
        .set_mentor(id, payload.mentor_id)
        .await?;

    Ok(Json(project))
}

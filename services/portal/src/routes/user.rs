//! User and authentication handlers

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::authz::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{LoginCredentials, NewUser, User, UserStatus};
use crate::state::AppState;
use crate::validation;

/// Response for registration and login: the user plus a bearer token
#[derive(Serialize)]
pub struct AuthResponse {
    pub data: User,
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Query parameters for directory lookups
#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_name(&payload.name).map_err(ApiError::InvalidArgument)?;
    validation::validate_email(&payload.email).map_err(ApiError::InvalidArgument)?;
    validation::validate_password(&payload.password).map_err(ApiError::InvalidArgument)?;

    let user = state.user_repository.create(&payload).await?;

    let token = state.jwt_service.generate_access_token(&user).map_err(|e| {
        tracing::error!("Failed to generate access token: {}", e);
        ApiError::InternalServerError
    })?;

    info!("User registered: {}", user.email);

    let response = AuthResponse {
        data: user,
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// User login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // Banning is terminal for login; the account itself is retained
    if user.status == UserStatus::Banned {
        return Err(ApiError::Forbidden);
    }

    if !state.user_repository.verify_password(&user, &payload.password)? {
        return Err(ApiError::InvalidCredential);
    }

    let token = state.jwt_service.generate_access_token(&user).map_err(|e| {
        tracing::error!("Failed to generate access token: {}", e);
        ApiError::InternalServerError
    })?;

    info!("User logged in: {}", user.email);

    let response = AuthResponse {
        data: user,
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    };

    Ok(Json(response))
}

/// Current user's profile
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Look up a mentor by email (project-creation directory)
pub async fn find_mentor(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<impl IntoResponse> {
    let email = query
        .email
        .ok_or_else(|| ApiError::InvalidArgument("Email query parameter is required".to_string()))?;

    let mentor = state
        .user_repository
        .find_mentor_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Mentor not found".to_string()))?;

    Ok(Json(json!({ "data": [mentor] })))
}

/// Look up a student by email (teammate-selection directory)
pub async fn find_student(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<impl IntoResponse> {
    let email = query
        .email
        .ok_or_else(|| ApiError::InvalidArgument("Email query parameter is required".to_string()))?;

    let data: Vec<User> = state
        .user_repository
        .find_by_email(&email)
        .await?
        .into_iter()
        .collect();

    Ok(Json(json!({ "data": data })))
}

/// General user directory; banned accounts are excluded
pub async fn list_active_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.user_repository.list_active().await?;
    Ok(Json(users))
}

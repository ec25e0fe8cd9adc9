//! Custom error types for the portal service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the portal service
///
/// `NotFound` deliberately covers both "entity absent" and "entity exists but
/// is not yours" for mentor- and author-scoped operations, so callers cannot
/// probe for the existence of resources they may not touch.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Password mismatch on login
    #[error("Invalid credentials")]
    InvalidCredential,

    /// Role or relationship does not permit the action
    #[error("Forbidden")]
    Forbidden,

    /// Entity absent, soft-deleted, or access-hidden
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation (duplicate email, duplicate membership)
    #[error("{0}")]
    Conflict(String),

    /// A team already carries the maximum of four teammates
    #[error("Team capacity exceeded: a project allows at most 4 teammates")]
    CapacityExceeded,

    /// Missing or malformed required field
    #[error("{0}")]
    InvalidArgument(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Database(common::error::DatabaseError::Query(e))
    }
}

impl ApiError {
    /// HTTP status code this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidCredential => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::CapacityExceeded => StatusCode::CONFLICT,
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalServerError | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            // Internal detail stays out of responses
            ApiError::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for portal results
pub type ApiResult<T> = Result<T, ApiError>;

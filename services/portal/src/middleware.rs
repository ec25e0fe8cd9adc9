//! Authentication middleware for bearer-token validation

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::authz::AuthUser;
use crate::error::ApiError;
use crate::jwt::TokenType;
use crate::state::AppState;

/// Validate the bearer token and attach the authenticated identity
///
/// Routes behind this middleware can rely on an `AuthUser` being present in
/// the request extensions; only access tokens are accepted.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        error!("Failed to validate token: {}", e);
        ApiError::Unauthorized
    })?;

    if claims.token_type != TokenType::Access {
        return Err(ApiError::Unauthorized);
    }

    let user = AuthUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    };

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

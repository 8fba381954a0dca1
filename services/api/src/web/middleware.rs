//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::state::AppState;

/// The identity attached to a request after the bearer token checks out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

/// Middleware that validates the bearer token and extracts the caller.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to
/// use. A missing token is 401, a token that fails verification is 403;
/// both are terminal for the request.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the Authorization header
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;

    // 2. Verify signature and expiry
    let claims = state.tokens.verify(token)?;

    // 3. Insert the caller identity into request extensions
    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        email: claims.email,
    });

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

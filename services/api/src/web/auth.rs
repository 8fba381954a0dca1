//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: signup, login, and token verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;
use glasspanel_core::domain::User;
use glasspanel_core::ports::PortError;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize, ToSchema)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: UserResponse,
}

fn required<'a>(field: &'a Option<String>, err: &str) -> Result<&'a str, ApiError> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::Validation(err.to_string())),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = required(&req.email, "Email and password required")?;
    let password = required(&req.password, "Email and password required")?;

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })?
        .to_string();

    // 2. Create the user
    let user = state
        .db
        .create_user(email, &password_hash, req.name.as_deref())
        .await?;

    // 3. Issue a bearer token so the client is logged in immediately
    let token = state.tokens.issue(user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Signup successful".to_string(),
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = required(&req.email, "Email and password required")?;
    let password = required(&req.password, "Email and password required")?;

    // 1. Look up credentials; an unknown email reads the same as a bad
    //    password from the outside.
    let creds = state
        .db
        .get_user_credentials(email)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => ApiError::Unauthorized("Invalid credentials".to_string()),
            other => ApiError::Port(other),
        })?;

    // 2. Verify the password
    let parsed_hash = PasswordHash::new(&creds.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;

    let valid = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();
    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    // 3. Record the login and issue a 30-day token
    state.db.touch_last_login(creds.id).await?;
    let token = state.tokens.issue(creds.id, &creds.email)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserResponse {
            id: creds.id,
            email: creds.email,
            name: creds.name,
        },
    }))
}

/// GET /api/auth/verify - Resolve the bearer token back to its user
#[utoipa::path(
    get,
    path = "/api/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Missing token"),
        (status = 403, description = "Invalid or expired token")
    ),
    security(("bearer_token" = []))
)]
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.db.get_user_by_id(auth.user_id).await?;
    Ok(Json(VerifyResponse {
        valid: true,
        user: user.into(),
    }))
}

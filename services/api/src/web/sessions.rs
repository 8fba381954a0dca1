//! services/api/src/web/sessions.rs
//!
//! Axum handlers for the glass-session resource: CRUD plus the
//! pause/resume and start/stop-conversation transitions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::web::parse_persona;
use crate::web::state::AppState;
use glasspanel_core::domain::{GlassSession, Persona};

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub session_name: Option<String>,
    pub persona: Option<String>,
    pub wpm: Option<i64>,
}

#[derive(Deserialize, ToSchema)]
pub struct StartConversationRequest {
    pub conversation_name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: i64,
    pub user_id: i64,
    pub session_name: String,
    pub device_id: Option<String>,
    pub persona: String,
    pub wpm: i64,
    pub is_active: bool,
    pub is_paused: bool,
    pub conversation_state: String,
    pub conversation_name: Option<String>,
    pub page_display_duration: i64,
    pub auto_advance_pages: bool,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<GlassSession> for SessionResponse {
    fn from(s: GlassSession) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            session_name: s.session_name,
            device_id: s.device_id,
            persona: s.persona.to_string(),
            wpm: s.wpm,
            is_active: s.is_active,
            is_paused: s.is_paused,
            conversation_state: s.conversation_state.to_string(),
            conversation_name: s.conversation_name,
            page_display_duration: s.page_display_duration,
            auto_advance_pages: s.auto_advance_pages,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/glass-sessions - List the caller's sessions, most recently
/// touched first.
#[utoipa::path(
    get,
    path = "/api/glass-sessions",
    responses(
        (status = 200, description = "The caller's sessions", body = [SessionResponse]),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_token" = []))
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.db.list_sessions(auth.user_id).await?;
    let body: Vec<SessionResponse> = sessions.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// POST /api/glass-sessions - Create a session.
///
/// Every field is optional: the name falls back to a timestamped default,
/// the persona to `work` and the reading speed to 180 wpm. Session names
/// are not unique.
#[utoipa::path(
    post,
    path = "/api/glass-sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 400, description = "Unknown persona"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_token" = []))
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session_name = req
        .session_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("Glass Session {}", Utc::now().timestamp_millis()));
    let persona = match req.persona.as_deref() {
        Some(raw) => parse_persona(raw)?,
        None => Persona::default(),
    };
    let wpm = req.wpm.unwrap_or(180);

    let session = state
        .db
        .create_session(auth.user_id, &session_name, persona, wpm)
        .await?;
    info!("Created glass session {} for user {}", session.id, auth.user_id);

    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

/// DELETE /api/glass-sessions/{id} - Delete a session and, by cascade, its
/// conversation log.
#[utoipa::path(
    delete,
    path = "/api/glass-sessions/{id}",
    params(("id" = i64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session deleted"),
        (status = 404, description = "Session absent or owned by another user")
    ),
    security(("bearer_token" = []))
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_session(session_id, auth.user_id).await?;
    Ok(Json(json!({ "message": "Session deleted" })))
}

/// POST /api/glass-sessions/{id}/pause - Pause display output.
/// Pausing an already-paused session is a no-op success.
#[utoipa::path(
    post,
    path = "/api/glass-sessions/{id}/pause",
    params(("id" = i64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session paused"),
        (status = 404, description = "Session absent or owned by another user")
    ),
    security(("bearer_token" = []))
)]
pub async fn pause_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .set_session_paused(session_id, auth.user_id, true)
        .await?;
    Ok(Json(json!({ "message": "Session paused" })))
}

/// POST /api/glass-sessions/{id}/resume - Resume display output.
#[utoipa::path(
    post,
    path = "/api/glass-sessions/{id}/resume",
    params(("id" = i64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session resumed"),
        (status = 404, description = "Session absent or owned by another user")
    ),
    security(("bearer_token" = []))
)]
pub async fn resume_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .set_session_paused(session_id, auth.user_id, false)
        .await?;
    Ok(Json(json!({ "message": "Session resumed" })))
}

/// POST /api/glass-sessions/{id}/start-conversation - Mark the session as
/// recording under a human-readable label.
///
/// There is no transition guard: starting while already recording simply
/// overwrites the conversation name, so concurrent starts race and the
/// last write wins.
#[utoipa::path(
    post,
    path = "/api/glass-sessions/{id}/start-conversation",
    params(("id" = i64, Path, description = "Session id")),
    request_body = StartConversationRequest,
    responses(
        (status = 200, description = "Conversation started"),
        (status = 404, description = "Session absent or owned by another user")
    ),
    security(("bearer_token" = []))
)]
pub async fn start_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<i64>,
    Json(req): Json<StartConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_name = req
        .conversation_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("Conversation {}", Utc::now().timestamp_millis()));

    state
        .db
        .start_conversation(session_id, auth.user_id, &conversation_name)
        .await?;
    info!(
        "Conversation \"{}\" started for session {}",
        conversation_name, session_id
    );

    Ok(Json(json!({
        "message": "Conversation started",
        "conversation_name": conversation_name,
        "conversation_state": "recording",
    })))
}

/// POST /api/glass-sessions/{id}/stop-conversation - Return the session to
/// idle and clear the conversation name. Callable from any state.
#[utoipa::path(
    post,
    path = "/api/glass-sessions/{id}/stop-conversation",
    params(("id" = i64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Conversation stopped"),
        (status = 404, description = "Session absent or owned by another user")
    ),
    security(("bearer_token" = []))
)]
pub async fn stop_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .stop_conversation(session_id, auth.user_id)
        .await?;
    info!("Conversation stopped for session {}", session_id);

    Ok(Json(json!({
        "message": "Conversation stopped",
        "conversation_state": "idle",
    })))
}

//! services/api/src/web/conversations.rs
//!
//! Axum handlers for the per-session conversation log. The log is
//! append-only; rows are never updated after creation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;
use glasspanel_core::domain::{Conversation, NewConversation};

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    pub query: Option<String>,
    pub response: Option<String>,
    pub response_pages: Option<Vec<String>>,
    pub duration: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct ConversationResponse {
    pub id: i64,
    pub session_id: i64,
    pub query: String,
    pub response: String,
    pub response_pages: Option<Vec<String>>,
    pub current_page: i64,
    pub duration: Option<i64>,
    pub persona: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            session_id: c.session_id,
            query: c.query,
            response: c.response,
            response_pages: c.response_pages,
            current_page: c.current_page,
            duration: c.duration,
            persona: c.persona.to_string(),
            timestamp: c.timestamp,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/glass-sessions/{id}/conversations - List a session's log,
/// newest first.
///
/// The rows are filtered by the session's CURRENT persona, not the persona
/// stored on each row: conversations created under a previous persona
/// become invisible if the session's persona later changes. Preserved
/// behavior, documented rather than fixed.
#[utoipa::path(
    get,
    path = "/api/glass-sessions/{id}/conversations",
    params(("id" = i64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Conversations for the session", body = [ConversationResponse]),
        (status = 404, description = "Session absent or owned by another user")
    ),
    security(("bearer_token" = []))
)]
pub async fn list_conversations_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.db.get_session(session_id, auth.user_id).await?;
    let conversations = state
        .db
        .list_conversations(session.id, session.persona)
        .await?;
    let body: Vec<ConversationResponse> = conversations.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// POST /api/glass-sessions/{id}/conversations - Append one query/response
/// exchange to the session's log.
///
/// The row stores a denormalized copy of the session's persona at insert
/// time; `response_pages`, when present, is the pre-split page sequence the
/// glasses cycle through.
#[utoipa::path(
    post,
    path = "/api/glass-sessions/{id}/conversations",
    params(("id" = i64, Path, description = "Session id")),
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation recorded", body = ConversationResponse),
        (status = 400, description = "Missing query or response"),
        (status = 404, description = "Session absent or owned by another user")
    ),
    security(("bearer_token" = []))
)]
pub async fn create_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<i64>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = req
        .query
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::Validation("Query and response required".to_string()))?;
    let response = req
        .response
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::Validation("Query and response required".to_string()))?;

    let session = state.db.get_session(session_id, auth.user_id).await?;
    let conversation = state
        .db
        .create_conversation(
            session.id,
            session.persona,
            NewConversation {
                query,
                response,
                response_pages: req.response_pages,
                duration: req.duration,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ConversationResponse::from(conversation)),
    ))
}

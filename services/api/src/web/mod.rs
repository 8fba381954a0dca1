//! services/api/src/web/mod.rs
//!
//! The web layer: handlers, auth middleware, shared state, and the master
//! OpenAPI definition.

pub mod auth;
pub mod conversations;
pub mod documents;
pub mod jwt;
pub mod middleware;
pub mod sessions;
pub mod state;

pub use middleware::require_auth;

use axum::response::{IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ApiError;
use glasspanel_core::domain::Persona;

pub(crate) fn parse_persona(raw: &str) -> Result<Persona, ApiError> {
    raw.parse::<Persona>().map_err(ApiError::Validation)
}

/// GET /health - Liveness probe, no auth.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::verify_handler,
        sessions::list_sessions_handler,
        sessions::create_session_handler,
        sessions::delete_session_handler,
        sessions::pause_session_handler,
        sessions::resume_session_handler,
        sessions::start_conversation_handler,
        sessions::stop_conversation_handler,
        conversations::list_conversations_handler,
        conversations::create_conversation_handler,
        documents::list_documents_handler,
        documents::create_document_handler,
        documents::delete_document_handler,
    ),
    components(schemas(
        auth::SignupRequest,
        auth::LoginRequest,
        auth::AuthResponse,
        auth::VerifyResponse,
        auth::UserResponse,
        sessions::CreateSessionRequest,
        sessions::StartConversationRequest,
        sessions::SessionResponse,
        conversations::CreateConversationRequest,
        conversations::ConversationResponse,
        documents::CreateDocumentRequest,
        documents::DocumentResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "GlassPanel API", description = "Control-panel API for paired smart-glasses sessions, conversations and documents.")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

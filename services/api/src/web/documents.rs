//! services/api/src/web/documents.rs
//!
//! Axum handlers for uploaded and transcribed documents.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::web::parse_persona;
use crate::web::state::AppState;
use glasspanel_core::domain::{Document, DocumentKind, Persona};

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct DocumentListQuery {
    pub persona: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    pub file_name: Option<String>,
    pub content: Option<String>,
    pub persona: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentResponse {
    pub id: i64,
    pub user_id: i64,
    pub file_name: String,
    pub content: String,
    pub persona: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(d: Document) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            file_name: d.file_name,
            content: d.content,
            persona: d.persona.to_string(),
            kind: d.kind.to_string(),
            created_at: d.created_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/documents?persona= - List the caller's documents, newest
/// first, optionally restricted to one persona.
#[utoipa::path(
    get,
    path = "/api/documents",
    params(("persona" = Option<String>, Query, description = "Restrict to one persona")),
    responses(
        (status = 200, description = "The caller's documents", body = [DocumentResponse]),
        (status = 400, description = "Unknown persona"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_token" = []))
)]
pub async fn list_documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<DocumentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let persona = query
        .persona
        .as_deref()
        .map(parse_persona)
        .transpose()?;

    let documents = state.db.list_documents(auth.user_id, persona).await?;
    let body: Vec<DocumentResponse> = documents.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// POST /api/documents - Store an uploaded or transcribed text blob.
///
/// `file_name` and `content` are required; persona defaults to `work` and
/// type to `upload`. No size cap is enforced here, only the transport
/// body limit.
#[utoipa::path(
    post,
    path = "/api/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = DocumentResponse),
        (status = 400, description = "Missing file name or content"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_token" = []))
)]
pub async fn create_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let file_name = req
        .file_name
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::Validation("File name and content required".to_string()))?;
    let content = req
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("File name and content required".to_string()))?;
    let persona = match req.persona.as_deref() {
        Some(raw) => parse_persona(raw)?,
        None => Persona::default(),
    };
    let kind = match req.kind.as_deref() {
        Some(raw) => raw
            .parse::<DocumentKind>()
            .map_err(ApiError::Validation)?,
        None => DocumentKind::default(),
    };

    let document = state
        .db
        .create_document(auth.user_id, &file_name, &content, persona, kind)
        .await?;

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

/// DELETE /api/documents/{id} - Delete one document owned by the caller.
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 404, description = "Document absent or owned by another user")
    ),
    security(("bearer_token" = []))
)]
pub async fn delete_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(document_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_document(document_id, auth.user_id).await?;
    Ok(Json(json!({ "message": "Document deleted" })))
}

//! crates/glasspanel_core/src/ports.rs
//!
//! Defines the service contract (trait) for the application's persistence.
//! This trait forms the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete database implementation and letting
//! the web layer run against an in-memory store in tests.

use async_trait::async_trait;

use crate::domain::{
    Conversation, Document, DocumentKind, GlassSession, NewConversation, Persona, User,
    UserCredentials,
};

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the underlying store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Persistence operations backing the REST resources.
///
/// Ownership checks are part of the contract: every method taking both an
/// entity id and a `user_id` must report `NotFound` when the row is absent
/// OR owned by another user, without distinguishing the two cases.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: i64) -> PortResult<User>;

    async fn get_user_credentials(&self, email: &str) -> PortResult<UserCredentials>;

    async fn touch_last_login(&self, user_id: i64) -> PortResult<()>;

    // --- Glass sessions ---
    async fn list_sessions(&self, user_id: i64) -> PortResult<Vec<GlassSession>>;

    async fn create_session(
        &self,
        user_id: i64,
        session_name: &str,
        persona: Persona,
        wpm: i64,
    ) -> PortResult<GlassSession>;

    async fn get_session(&self, session_id: i64, user_id: i64) -> PortResult<GlassSession>;

    async fn delete_session(&self, session_id: i64, user_id: i64) -> PortResult<()>;

    async fn set_session_paused(
        &self,
        session_id: i64,
        user_id: i64,
        paused: bool,
    ) -> PortResult<()>;

    /// Marks the session as recording under the given conversation name.
    /// Deliberately callable from any state; a second start overwrites the
    /// name (last write wins).
    async fn start_conversation(
        &self,
        session_id: i64,
        user_id: i64,
        conversation_name: &str,
    ) -> PortResult<()>;

    /// Returns the session to idle and clears the conversation name.
    /// Callable from any state.
    async fn stop_conversation(&self, session_id: i64, user_id: i64) -> PortResult<()>;

    // --- Conversations ---
    /// Lists the conversations of a session filtered by the given persona
    /// (the caller passes the session's current persona), newest first.
    async fn list_conversations(
        &self,
        session_id: i64,
        persona: Persona,
    ) -> PortResult<Vec<Conversation>>;

    async fn create_conversation(
        &self,
        session_id: i64,
        persona: Persona,
        entry: NewConversation,
    ) -> PortResult<Conversation>;

    // --- Documents ---
    async fn list_documents(
        &self,
        user_id: i64,
        persona: Option<Persona>,
    ) -> PortResult<Vec<Document>>;

    async fn create_document(
        &self,
        user_id: i64,
        file_name: &str,
        content: &str,
        persona: Persona,
        kind: DocumentKind,
    ) -> PortResult<Document>;

    async fn delete_document(&self, document_id: i64, user_id: i64) -> PortResult<()>;
}

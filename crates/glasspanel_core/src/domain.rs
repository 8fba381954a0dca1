//! crates/glasspanel_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A caller-chosen partition tag scoping which sessions and documents are
/// visible together. Not a security boundary; tenant isolation is by user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Work,
    Home,
    Personal,
}

impl Default for Persona {
    fn default() -> Self {
        Persona::Work
    }
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Work => "work",
            Persona::Home => "home",
            Persona::Personal => "personal",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Persona::Work),
            "home" => Ok(Persona::Home),
            "personal" => Ok(Persona::Personal),
            other => Err(format!("unknown persona '{}'", other)),
        }
    }
}

/// Whether a glass session currently has an active conversation recording.
///
/// `Recording` implies `conversation_name` is set on the session; `Idle`
/// implies it is cleared. The start/stop transitions are deliberately
/// unguarded: starting while already recording overwrites the name
/// (last write wins), and stopping while idle is a no-op success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Idle,
    Recording,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Idle => "idle",
            ConversationState::Recording => "recording",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(ConversationState::Idle),
            "recording" => Ok(ConversationState::Recording),
            other => Err(format!("unknown conversation state '{}'", other)),
        }
    }
}

/// How a document entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Upload,
    Transcription,
}

impl Default for DocumentKind {
    fn default() -> Self {
        DocumentKind::Upload
    }
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Upload => "upload",
            DocumentKind::Transcription => "transcription",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(DocumentKind::Upload),
            "transcription" => Ok(DocumentKind::Transcription),
            other => Err(format!("unknown document type '{}'", other)),
        }
    }
}

// Represents a user - used throughout the app. Owns every other entity
// transitively via user_id.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

// Only used internally for login - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
}

/// A logical recording session associated with a paired smart-glasses
/// device, tracking pause state and an optional active conversation.
#[derive(Debug, Clone, Serialize)]
pub struct GlassSession {
    pub id: i64,
    pub user_id: i64,
    pub session_name: String,
    pub device_id: Option<String>,
    pub persona: Persona,
    pub wpm: i64,
    pub is_active: bool,
    pub is_paused: bool,
    pub conversation_state: ConversationState,
    pub conversation_name: Option<String>,
    pub page_display_duration: i64,
    pub auto_advance_pages: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One query/response exchange logged under a session. Append-only; the
/// persona is a denormalized copy of the parent session's persona at
/// insert time. `current_page` is client-local display state.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: i64,
    pub session_id: i64,
    pub query: String,
    pub response: String,
    pub response_pages: Option<Vec<String>>,
    pub current_page: i64,
    pub duration: Option<i64>,
    pub persona: Persona,
    pub timestamp: DateTime<Utc>,
}

/// Fields for appending a conversation to a session's log.
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub query: String,
    pub response: String,
    pub response_pages: Option<Vec<String>>,
    pub duration: Option<i64>,
}

/// An uploaded or transcribed text blob owned by a user.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i64,
    pub user_id: i64,
    pub file_name: String,
    pub content: String,
    pub persona: Persona,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_round_trips_through_str() {
        for p in [Persona::Work, Persona::Home, Persona::Personal] {
            assert_eq!(p.as_str().parse::<Persona>().unwrap(), p);
        }
        assert!("office".parse::<Persona>().is_err());
    }

    #[test]
    fn conversation_state_round_trips_through_str() {
        assert_eq!(
            "idle".parse::<ConversationState>().unwrap(),
            ConversationState::Idle
        );
        assert_eq!(
            "recording".parse::<ConversationState>().unwrap(),
            ConversationState::Recording
        );
        assert!("paused".parse::<ConversationState>().is_err());
    }

    #[test]
    fn enum_defaults_are_work_and_upload() {
        assert_eq!(Persona::default(), Persona::Work);
        assert_eq!(DocumentKind::default(), DocumentKind::Upload);
    }
}

pub mod domain;
pub mod ports;

pub use domain::{
    Conversation, ConversationState, Document, DocumentKind, GlassSession, NewConversation,
    Persona, User, UserCredentials,
};
pub use ports::{DatabaseService, PortError, PortResult};

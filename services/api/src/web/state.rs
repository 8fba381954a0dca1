//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::jwt::TokenManager;
use glasspanel_core::ports::DatabaseService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The persistence client is injected here rather than reached
/// through a process-wide singleton so tests can swap in an ephemeral store.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub tokens: TokenManager,
}

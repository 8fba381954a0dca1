//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
///
/// The two external API keys are fail-fast: the process refuses to start
/// without them. The JWT secret falls back to a development default.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub package_name: String,
    pub mentraos_api_key: String,
    pub anthropic_api_key: String,
    pub jwt_secret: String,
    pub backend_url: String,
    pub llm_model: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8112".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:glasspanel.db?mode=rwc".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load MentraOS / LLM Settings ---
        let package_name = std::env::var("PACKAGE_NAME")
            .unwrap_or_else(|_| "com.phonegpt.app".to_string());

        // Both API keys are required; refusing to start beats failing on the
        // first device pairing or transcription request.
        let mentraos_api_key = std::env::var("MENTRAOS_API_KEY")
            .map_err(|_| ConfigError::MissingVar("MENTRAOS_API_KEY".to_string()))?;
        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ConfigError::MissingVar("ANTHROPIC_API_KEY".to_string()))?;

        let jwt_secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-jwt-secret-key-change-in-production".to_string());

        let backend_url = std::env::var("BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:8112".to_string());
        let llm_model = std::env::var("LLM_MODEL")
            .unwrap_or_else(|_| "claude-3-haiku-20240307".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            package_name,
            mentraos_api_key,
            anthropic_api_key,
            jwt_secret,
            backend_url,
            llm_model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them in one test so they
    // cannot race each other.
    #[test]
    fn missing_api_keys_are_fatal_and_defaults_apply() {
        std::env::remove_var("MENTRAOS_API_KEY");
        std::env::remove_var("ANTHROPIC_API_KEY");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingVar(var)) if var == "MENTRAOS_API_KEY"
        ));

        std::env::set_var("MENTRAOS_API_KEY", "mk-test");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingVar(var)) if var == "ANTHROPIC_API_KEY"
        ));

        std::env::set_var("ANTHROPIC_API_KEY", "ak-test");
        std::env::remove_var("BIND_ADDRESS");
        std::env::remove_var("RUST_LOG");
        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address.port(), 8112);
        assert_eq!(config.package_name, "com.phonegpt.app");
        assert_eq!(config.llm_model, "claude-3-haiku-20240307");
        assert_eq!(config.log_level, Level::INFO);
    }
}

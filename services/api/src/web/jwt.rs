//! services/api/src/web/jwt.rs
//!
//! Bearer token handling for the control-panel API.
//!
//! Tokens are signed with HS256 against the shared secret from config and
//! carry a fixed 30-day expiry set at login. There is no refresh flow: an
//! expired token is terminal and the client must log in again.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ApiError;

/// Tokens are valid for 30 days from issue.
pub const TOKEN_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Payload stored in the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Signs and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenManager {
    secret: String,
}

impl TokenManager {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issues a token for an authenticated user.
    pub fn issue(&self, user_id: i64, email: &str) -> Result<String, ApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ApiError::Internal(format!("System time error: {}", e)))?
            .as_secs();

        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECONDS,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature and expiry, returning the claims on success.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::Forbidden("Invalid or expired token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_to_same_user() {
        let tokens = TokenManager::new("test-secret-test-secret-test-secret");
        let token = tokens.issue(42, "a@b.com").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECONDS);
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let ours = TokenManager::new("secret-a-secret-a-secret-a-secret-a");
        let theirs = TokenManager::new("secret-b-secret-b-secret-b-secret-b");
        let token = theirs.issue(1, "a@b.com").unwrap();
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenManager::new("test-secret-test-secret-test-secret");
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            user_id: 1,
            email: "a@b.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-test-secret-test-secret".as_bytes()),
        )
        .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = TokenManager::new("test-secret-test-secret-test-secret");
        assert!(tokens.verify("not-a-token").is_err());
    }
}

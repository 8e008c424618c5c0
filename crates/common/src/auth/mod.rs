//! Authentication and authorization utilities
//!
//! Provides:
//! - Password hashing and verification (argon2)
//! - JWT token generation and validation
//! - The authenticated-user extractor for handlers

use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID
    pub user_id: i64,

    /// Username
    pub username: String,

    /// Staff flag (elevated identity, may mutate any book)
    pub is_staff: bool,

    /// Request ID for tracing
    pub request_id: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Username
    pub username: String,

    /// Staff flag
    #[serde(default)]
    pub is_staff: bool,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, user_id: i64, username: &str, is_staff: bool) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            is_staff,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AppError::Internal {
        message: format!("Stored password hash is malformed: {}", e),
    })?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::InvalidCredentials)
}

/// Extract a bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Axum extractor for AuthContext
///
/// The router installs an `Extension<Arc<JwtManager>>` layer; the extractor
/// validates the bearer token against it.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        // Extract request ID
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let jwt = parts
            .extensions
            .get::<Arc<JwtManager>>()
            .cloned()
            .ok_or_else(|| AppError::Internal {
                message: "JwtManager extension not installed".to_string(),
            })?;

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header is not a bearer token".to_string(),
        })?;

        let claims = jwt.validate_token(token)?;

        let user_id = claims.sub.parse::<i64>().map_err(|_| AppError::InvalidToken)?;

        Ok(AuthContext {
            user_id,
            username: claims.username,
            is_staff: claims.is_staff,
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("abc.def.ghi"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);

        let token = manager.generate_token(42, "test_username", true).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "test_username");
        assert!(claims.is_staff);
    }

    #[test]
    fn test_jwt_wrong_secret() {
        let manager = JwtManager::new("test_secret", 3600);
        let other = JwtManager::new("other_secret", 3600);

        let token = manager.generate_token(42, "test_username", false).unwrap();
        assert!(matches!(
            other.validate_token(&token),
            Err(AppError::InvalidToken)
        ));
    }
}

//! HS256 JWT support.
//!
//! Tokens carry the user id and role, but the middleware re-reads the user
//! row on every request; claims only bootstrap the lookup, so a stale role
//! inside a token never grants stale permissions.

use chrono::Utc;
use inkpress_core::{models::Role, AppError};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub username: String,
    pub role: Role,
    /// Issued-at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// JWT service with symmetric signing (HS256)
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl JwtService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    /// Issue a token for a user.
    pub fn issue(&self, user_id: i64, username: &str, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(self.expiry_hours)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::Unauthorized("Token expired".to_string())
                    }
                    _ => AppError::Unauthorized("Invalid token".to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret-key-min-32-characters-long", 24)
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let jwt = service();
        let token = jwt.issue(42, "alex", Role::User).unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alex");
        assert_eq!(claims.role, Role::User);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = service().issue(1, "alex", Role::Admin).unwrap();
        let other = JwtService::new("another-secret-key-of-decent-length", 24);
        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = service();
        let now = Utc::now();
        // Expired well past the default validation leeway
        let claims = Claims {
            sub: 1,
            username: "alex".to_string(),
            role: Role::User,
            iat: (now - chrono::Duration::hours(2)).timestamp(),
            exp: (now - chrono::Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-min-32-characters-long"),
        )
        .unwrap();

        let err = jwt.verify(&token).unwrap_err();
        match err {
            AppError::Unauthorized(msg) => assert_eq!(msg, "Token expired"),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let err = service().verify("not-a-jwt").unwrap_err();
        match err {
            AppError::Unauthorized(msg) => assert_eq!(msg, "Invalid token"),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }
}

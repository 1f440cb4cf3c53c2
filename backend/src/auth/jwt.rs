//! Access token validation
//!
//! Tokens are issued by the BaaS auth API and signed with the project's
//! HS256 secret. They are validated locally so protected routes do not pay
//! a round trip to the auth API.

use anyhow::Result;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Audience of tokens issued to signed-in users
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// JWT service for token validation
///
/// The decoding key is derived once and shared behind an `Arc`.
#[derive(Clone)]
pub struct JwtService {
    decoding: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtService {
    /// Create a validator for tokens signed with `secret`
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

        Self {
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
        }
    }

    /// Validate a token and return claims
    #[inline]
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }
}

/// Sign a token the way the BaaS does, for tests
#[cfg(test)]
pub(crate) fn sign_test_token(secret: &str, user_id: uuid::Uuid, expires_in_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: Some("cook@example.com".to_string()),
        role: Some("authenticated".to_string()),
        aud: AUTHENTICATED_AUDIENCE.to_string(),
        exp: now + expires_in_secs,
        iat: Some(now),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

//! Authentication extractor
//!
//! Validates the bearer token with the pre-computed JWT service from
//! `AppState` and keeps the raw token so BaaS calls run as the user.

use crate::baas::RestClient;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

/// Authenticated user extracted from the bearer token
#[derive(Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    /// Token as presented; forwarded to the BaaS for row-level security
    pub access_token: String,
}

impl AuthUser {
    /// Table client acting as this user
    pub fn rest(&self, state: &AppState) -> RestClient {
        state.baas().rest(&self.access_token)
    }
}

impl std::fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthUser")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization format".to_string()))?;

        let claims = app_state
            .jwt()
            .validate_token(token)
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
            access_token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_user_debug_hides_token() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            email: None,
            access_token: "very-secret-token".to_string(),
        };
        let debug_str = format!("{:?}", user);
        assert!(debug_str.contains("AuthUser"));
        assert!(!debug_str.contains("very-secret-token"));
    }
}

//! Session management on top of the BaaS auth API
//!
//! Credentials never touch this service's storage: signup, password grants
//! and refreshes are delegated, and only the `users` profile row is written
//! here.

use crate::auth::AuthUser;
use crate::baas::{BaasClient, BaasError, BaasSession};
use crate::cache::ResponseCache;
use crate::error::ApiError;
use crate::rate_limit::FixedWindowLimiter;
use crate::repositories::{CreateUserProfile, UserRepository};
use chrono::Utc;
use healthymeal_shared::types::{
    AuthUserInfo, CurrentUserResponse, LoginRequest, LoginResponse, RefreshRequest,
    SessionTokens, SignUpRequest, SignUpResponse,
};
use healthymeal_shared::validation::{validate_email, validate_signup_password};
use tracing::{info, warn};

const TOO_MANY_ATTEMPTS: &str = "Too many login attempts. Please try again later.";

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Register a new account
    ///
    /// The profile row is written with the new session's token; when that
    /// fails the signup still succeeds and the failure is only logged.
    pub async fn sign_up(
        baas: &BaasClient,
        req: &SignUpRequest,
        redirect_to: Option<&str>,
    ) -> Result<SignUpResponse, ApiError> {
        validate_email(&req.email).map_err(ApiError::Validation)?;
        validate_signup_password(&req.password).map_err(ApiError::Validation)?;

        let outcome = baas
            .auth()
            .sign_up(&req.email, &req.password, redirect_to)
            .await
            .map_err(|e| match e {
                e if e.is_already_registered() => {
                    ApiError::EmailExists("Email already exists".to_string())
                }
                BaasError::Api { message, .. } => ApiError::Auth(message),
                other => ApiError::baas("Signup failed", other),
            })?;

        let user = outcome.user();
        let email = user.email.clone().unwrap_or_else(|| req.email.clone());
        info!(user_id = %user.id, "User signed up");

        if let Some(session) = outcome.session() {
            let profile = CreateUserProfile::new(user.id, &email);
            if let Err(e) = UserRepository::create(&baas.rest(&session.access_token), &profile).await {
                warn!(user_id = %user.id, error = %e, "Failed to create user profile row");
            }
        }

        Ok(SignUpResponse {
            user: AuthUserInfo { id: user.id, email },
            session: outcome.session().map(session_tokens),
        })
    }

    /// Password login, limited per email
    pub async fn login(
        baas: &BaasClient,
        limiter: &FixedWindowLimiter,
        req: &LoginRequest,
    ) -> Result<LoginResponse, ApiError> {
        limiter
            .check(&req.email)
            .map_err(|limited| ApiError::TooManyRequests {
                message: TOO_MANY_ATTEMPTS.to_string(),
                retry_after_secs: limited.retry_after_secs(),
            })?;

        if req.email.is_empty() || req.password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let session = baas
            .auth()
            .sign_in_with_password(&req.email, &req.password)
            .await
            .map_err(|e| match e {
                BaasError::Api { message, .. } if !message.is_empty() => {
                    ApiError::Unauthorized(message)
                }
                BaasError::Api { .. } => ApiError::Unauthorized("Invalid credentials".to_string()),
                other => ApiError::baas("Login failed", other),
            })?;

        limiter.reset(&req.email);

        let user_id = session.user.id;
        if let Err(e) =
            UserRepository::touch_last_login(&baas.rest(&session.access_token), user_id, Utc::now())
                .await
        {
            warn!(%user_id, error = %e, "Failed to update last login");
        }

        info!(%user_id, "User logged in");
        Ok(login_response(&session, &req.email))
    }

    /// End the session; the user's cached responses are dropped either way
    pub async fn logout(
        baas: &BaasClient,
        cache: &ResponseCache,
        user: &AuthUser,
    ) -> Result<(), ApiError> {
        let result = baas.auth().sign_out(&user.access_token).await;
        cache.invalidate_user(user.user_id).await;

        result.map_err(|e| {
            warn!(user_id = %user.user_id, error = %e, "Logout failed");
            ApiError::baas("Logout failed", e)
        })?;
        info!(user_id = %user.user_id, "User logged out");
        Ok(())
    }

    /// Exchange a refresh token for a new session
    pub async fn refresh(baas: &BaasClient, req: &RefreshRequest) -> Result<LoginResponse, ApiError> {
        if req.refresh_token.trim().is_empty() {
            return Err(ApiError::Validation("Refresh token is required".to_string()));
        }

        let session = baas
            .auth()
            .refresh_session(&req.refresh_token)
            .await
            .map_err(|e| match e {
                BaasError::Api { message, .. } => ApiError::Unauthorized(message),
                other => ApiError::baas("Token refresh failed", other),
            })?;

        Ok(login_response(&session, ""))
    }

    pub async fn current_user(
        baas: &BaasClient,
        user: &AuthUser,
    ) -> Result<CurrentUserResponse, ApiError> {
        let current = baas
            .auth()
            .get_user(&user.access_token)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch current user"))?;

        Ok(CurrentUserResponse {
            id: current.id,
            email: current.email,
            created_at: current.created_at,
            last_sign_in_at: current.last_sign_in_at,
        })
    }
}

fn session_tokens(session: &BaasSession) -> SessionTokens {
    SessionTokens {
        access_token: session.access_token.clone(),
        refresh_token: session.refresh_token.clone(),
        expires_in: session.expires_in,
    }
}

fn login_response(session: &BaasSession, fallback_email: &str) -> LoginResponse {
    LoginResponse {
        user: AuthUserInfo {
            id: session.user.id,
            email: session
                .user
                .email
                .clone()
                .unwrap_or_else(|| fallback_email.to_string()),
        },
        session: session_tokens(session),
    }
}

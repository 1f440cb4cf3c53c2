//! Session authentication endpoints of the BaaS

use super::client::{decode_json, BaasClient};
use super::error::BaasError;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// User object as returned by the auth API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaasUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

/// Authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaasSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: BaasUser,
}

/// Result of a signup: a live session when accounts are auto-confirmed,
/// otherwise the pending user
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    Session(BaasSession),
    User(BaasUser),
}

impl SignUpOutcome {
    pub fn user(&self) -> &BaasUser {
        match self {
            SignUpOutcome::Session(session) => &session.user,
            SignUpOutcome::User(user) => user,
        }
    }

    pub fn session(&self) -> Option<&BaasSession> {
        match self {
            SignUpOutcome::Session(session) => Some(session),
            SignUpOutcome::User(_) => None,
        }
    }
}

/// Auth API handle
pub struct AuthApi {
    client: BaasClient,
}

impl AuthApi {
    pub(crate) fn new(client: BaasClient) -> Self {
        Self { client }
    }

    /// Register a new account
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome, BaasError> {
        let mut builder = self
            .client
            .request(Method::POST, "/auth/v1/signup")
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "email": email },
            }));
        if let Some(redirect) = redirect_to {
            builder = builder.query(&[("redirect_to", redirect)]);
        }
        let response = self.client.send(builder, "auth_signup", "signup").await?;
        decode_json(response).await
    }

    /// Password grant
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<BaasSession, BaasError> {
        let builder = self
            .client
            .request(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let response = self.client.send(builder, "auth_token", "password").await?;
        decode_json(response).await
    }

    /// Refresh token grant
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<BaasSession, BaasError> {
        let builder = self
            .client
            .request(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));
        let response = self
            .client
            .send(builder, "auth_token", "refresh_token")
            .await?;
        decode_json(response).await
    }

    /// Revoke the session behind `access_token`
    pub async fn sign_out(&self, access_token: &str) -> Result<(), BaasError> {
        let builder = self
            .client
            .request(Method::POST, "/auth/v1/logout")
            .bearer_auth(access_token);
        self.client.send(builder, "auth_logout", "logout").await?;
        Ok(())
    }

    /// User owning `access_token`
    pub async fn get_user(&self, access_token: &str) -> Result<BaasUser, BaasError> {
        let builder = self
            .client
            .request(Method::GET, "/auth/v1/user")
            .bearer_auth(access_token);
        let response = self.client.send(builder, "auth_user", "user").await?;
        decode_json(response).await
    }
}

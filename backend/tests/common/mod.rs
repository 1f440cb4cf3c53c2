//! Common test utilities for integration tests
//!
//! Each `TestApp` runs the real router against a wiremock server standing
//! in for the BaaS project and the LLM endpoint.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use healthymeal_backend::{
    auth::{Claims, AUTHENTICATED_AUDIENCE},
    cache::ResponseCache,
    config::AppConfig,
    routes,
    state::AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::MockServer;

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only-32chars";

/// Response as seen by a client
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `error.code` of an error body
    pub fn error_code(&self) -> Option<&str> {
        self.body.pointer("/error/code").and_then(Value::as_str)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.body.pointer("/error/message").and_then(Value::as_str)
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub server: MockServer,
    pub user_id: Uuid,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Test app whose configuration is adjusted by `customize`
    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let server = MockServer::start().await;
        let mut config = test_config(&server);
        customize(&mut config);

        let ttl = Duration::from_secs(config.cache.ttl_secs);
        let state = AppState::new(config, ResponseCache::in_memory(ttl))
            .expect("Failed to build test state");
        let app = routes::create_router(state);

        let user_id = Uuid::new_v4();
        let token = mint_token(user_id, 3600);
        Self {
            app,
            server,
            user_id,
            token,
        }
    }

    async fn send(&self, method: &str, path: &str, body: Option<Value>, authed: bool) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if authed {
            builder = builder.header("Authorization", format!("Bearer {}", self.token));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Make an unauthenticated GET request
    pub async fn get_public(&self, path: &str) -> TestResponse {
        self.send("GET", path, None, false).await
    }

    /// Make an unauthenticated POST request with JSON body
    pub async fn post_public(&self, path: &str, body: Value) -> TestResponse {
        self.send("POST", path, Some(body), false).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send("GET", path, None, true).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.send("POST", path, Some(body), true).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.send("PUT", path, Some(body), true).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.send("DELETE", path, None, true).await
    }
}

/// Access token as the BaaS would issue it
pub fn mint_token(user_id: Uuid, expires_in_secs: i64) -> String {
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
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn test_config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.port = 0;
    config.baas.url = server.uri();
    config.baas.anon_key = "anon-test-key".to_string();
    config.baas.jwt_secret = JWT_SECRET.to_string();
    config.baas.timeout_secs = 5;
    config.llm.api_url = format!("{}/llm/chat/completions", server.uri());
    config.llm.api_key = "sk-or-test".to_string();
    config.llm.timeout_secs = 5;
    config
}

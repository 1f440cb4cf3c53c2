//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! Everything expensive (JWT keys, HTTP connection pools, limiter tables)
//! is built once at startup; cloning the state only bumps reference counts.

use crate::auth::JwtService;
use crate::baas::BaasClient;
use crate::cache::ResponseCache;
use crate::config::AppConfig;
use crate::llm::OpenRouterClient;
use crate::rate_limit::{FixedWindowLimiter, WindowAnchor};
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Pre-initialized JWT service with cached keys
    pub jwt: JwtService,
    /// BaaS client; table calls are made per request with the user's token
    pub baas: BaasClient,
    pub cache: ResponseCache,
    /// Login attempts per email
    pub login_limiter: Arc<FixedWindowLimiter>,
    /// Generation requests per user
    pub generation_limiter: Arc<FixedWindowLimiter>,
    pub llm: Arc<OpenRouterClient>,
    /// Prometheus renderer, absent when no recorder was installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state
    ///
    /// Builds the HTTP clients and derives the JWT key, so call it once at
    /// startup.
    pub fn new(config: AppConfig, cache: ResponseCache) -> Result<Self> {
        let jwt = JwtService::new(&config.baas.jwt_secret);
        let baas = BaasClient::new(
            &config.baas.url,
            &config.baas.anon_key,
            Duration::from_secs(config.baas.timeout_secs),
        )?;
        let llm = OpenRouterClient::new(&config.llm)?;

        let limits = &config.rate_limit;
        let login_limiter = FixedWindowLimiter::new(
            limits.login_max_attempts,
            Duration::from_secs(limits.login_window_secs),
            WindowAnchor::LastRequest,
        );
        let generation_limiter = FixedWindowLimiter::new(
            limits.generation_max_requests,
            Duration::from_secs(limits.generation_window_secs),
            WindowAnchor::FirstRequest,
        );

        Ok(Self {
            config: Arc::new(config),
            jwt,
            baas,
            cache,
            login_limiter: Arc::new(login_limiter),
            generation_limiter: Arc::new(generation_limiter),
            llm: Arc::new(llm),
            metrics: None,
        })
    }

    /// Attach the Prometheus renderer served at `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the JWT service
    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    #[inline]
    pub fn baas(&self) -> &BaasClient {
        &self.baas
    }

    #[inline]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let config = AppConfig::default();
        let ttl = Duration::from_secs(config.cache.ttl_secs);
        AppState::new(config, ResponseCache::in_memory(ttl)).unwrap()
    }

    #[tokio::test]
    async fn test_state_clone_shares_limiters() {
        let state = state();
        let cloned = state.clone();

        state.login_limiter.check("cook@example.com").unwrap();
        assert_eq!(
            cloned.login_limiter.remaining("cook@example.com"),
            state.config.rate_limit.login_max_attempts - 1
        );
    }

    #[tokio::test]
    async fn test_jwt_service_is_precomputed() {
        let state = state();
        let user_id = uuid::Uuid::new_v4();
        let token = crate::auth::sign_test_token(&state.config.baas.jwt_secret, user_id, 60);
        let claims = state.jwt().validate_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }
}

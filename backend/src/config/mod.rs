//! Configuration management for the HealthyMeal backend
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: HM__)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub baas: BaasConfig,
    pub redis: RedisConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Where confirmation emails send users back to
    #[serde(default)]
    pub public_url: Option<String>,
}

/// Backend-as-a-service project settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaasConfig {
    /// Project URL, e.g. https://xyz.supabase.co
    pub url: String,
    /// Public anon key sent as `apikey` on every request
    pub anon_key: String,
    /// Secret the project signs access tokens with
    pub jwt_secret: String,
    pub timeout_secs: u64,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub enabled: bool,
}

/// OpenRouter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub enabled: bool,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    /// Sent as `HTTP-Referer`
    pub app_url: String,
    /// Sent as `X-Title`
    pub app_title: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "openai/gpt-4o-mini".to_string(),
            app_url: "http://localhost:4200".to_string(),
            app_title: "HealthyMeal".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout_secs: 60,
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Fixed-window limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub login_max_attempts: u32,
    pub login_window_secs: u64,
    pub generation_max_requests: u32,
    pub generation_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_max_attempts: 5,
            login_window_secs: 3600,
            generation_max_requests: 10,
            generation_window_secs: 60,
        }
    }
}

/// CORS settings; an empty list allows any origin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                public_url: None,
            },
            baas: BaasConfig {
                url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                jwt_secret: "development-secret-change-in-production".to_string(),
                timeout_secs: 15,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                enabled: false,
            },
            llm: LlmConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with HM__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name(&config_file).required(false))
            // e.g. HM__BAAS__ANON_KEY=... sets baas.anon_key
            .add_source(
                config::Environment::with_prefix("HM")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }

    /// Problems that make this configuration unfit for production
    pub fn production_errors(&self) -> Vec<&'static str> {
        let mut errors = Vec::new();

        if self.baas.url.is_empty()
            || self.baas.url.contains("localhost")
            || self.baas.url.contains("127.0.0.1")
        {
            errors.push("BaaS URL must point at the hosted project");
        }
        if self.baas.anon_key.is_empty() {
            errors.push("BaaS anon key must be set");
        }
        if self.baas.jwt_secret.contains("development") || self.baas.jwt_secret.len() < 32 {
            errors.push("BaaS JWT secret must be at least 32 characters and not contain 'development'");
        }
        if self.llm.enabled && self.llm.api_key.is_empty() {
            errors.push("LLM API key must be set when recipe generation is enabled");
        }

        errors
    }
}

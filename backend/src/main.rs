//! HealthyMeal Backend
//!
//! Recipe collection and AI recipe generation for dietary goals.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! - Routes: HTTP request handling and routing
//! - Services: Business logic, caching and rate limits
//! - Repositories: Table access through the BaaS REST API
//! - BaaS: hosted Postgres, auth and row-level security

use anyhow::Result;
use healthymeal_backend::{
    cache::{self, RedisStore, ResponseCache},
    config, rate_limit, routes,
    state::AppState,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CLEANUP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting HealthyMeal Backend"
    );

    // Validate production configuration
    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    let metrics = install_metrics_recorder();

    // Redis backs the response cache when available; memory otherwise
    let ttl = Duration::from_secs(config.cache.ttl_secs);
    let response_cache = if config.redis.enabled {
        match connect_redis(&config.redis.url).await {
            Some(conn) => ResponseCache::new(Arc::new(RedisStore::new(conn)), ttl),
            None => ResponseCache::in_memory(ttl),
        }
    } else {
        ResponseCache::in_memory(ttl)
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let mut state = AppState::new(config, response_cache)?;
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    if !state.llm.is_enabled() {
        warn!("Recipe generation is disabled");
    }

    let cleanup = [
        rate_limit::spawn_cleanup(state.login_limiter.clone(), CLEANUP_PERIOD),
        rate_limit::spawn_cleanup(state.generation_limiter.clone(), CLEANUP_PERIOD),
        cache::spawn_cleanup(state.cache.clone(), CLEANUP_PERIOD),
    ];

    // Build application
    let app = routes::create_router(state);

    // Start server
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for task in cleanup {
        task.abort();
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Install the global Prometheus recorder
///
/// Returns None when a recorder is already installed; metrics calls then go
/// to that recorder and `/metrics` answers 404.
fn install_metrics_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to install metrics recorder: {}", e);
            None
        }
    }
}

/// Connect to Redis with graceful fallback
///
/// Returns None if Redis is unavailable, allowing the app to run with the
/// in-memory cache
async fn connect_redis(url: &str) -> Option<ConnectionManager> {
    info!("Connecting to Redis...");

    match redis::Client::open(url) {
        Ok(client) => match ConnectionManager::new(client).await {
            Ok(conn) => {
                info!("Redis connection established");
                Some(conn)
            }
            Err(e) => {
                warn!("Failed to connect to Redis: {}. Using in-memory cache.", e);
                None
            }
        },
        Err(e) => {
            warn!("Invalid Redis URL: {}. Using in-memory cache.", e);
            None
        }
    }
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "healthymeal_backend=info,tower_http=info".into()
        } else {
            "healthymeal_backend=debug,tower_http=debug".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let errors = config.production_errors();

    if config.cors.allowed_origins.is_empty() {
        warn!("No CORS origins configured - any origin will be allowed");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

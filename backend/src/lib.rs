//! HealthyMeal Backend Library
//!
//! This library exposes the backend modules for use in tests and other crates.

pub mod auth;
pub mod baas;
pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod rate_limit;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;

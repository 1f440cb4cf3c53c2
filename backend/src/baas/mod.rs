//! Client for the hosted backend-as-a-service
//!
//! Wraps the session auth endpoints and the REST table interface.

mod auth;
mod client;
mod error;
mod query;

pub use auth::{AuthApi, BaasSession, BaasUser, SignUpOutcome};
pub use client::{BaasClient, RestClient};
pub use error::BaasError;
pub use query::{escape_like, parse_content_range, Fetched, TableQuery};

//! Error types for the HealthyMeal application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error codes returned in API error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    EmailExists,
    AuthError,
    RateLimited,
    BaasError,
    GenerationError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::EmailExists => "EMAIL_EXISTS",
            ErrorCode::AuthError => "AUTH_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::BaasError => "BAAS_ERROR",
            ErrorCode::GenerationError => "GENERATION_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by `FromStr` impls of the wire enums
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_like_as_str() {
        for code in [
            ErrorCode::ValidationError,
            ErrorCode::EmailExists,
            ErrorCode::RateLimited,
            ErrorCode::BaasError,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }
}

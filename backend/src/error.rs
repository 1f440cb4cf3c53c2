//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to appropriate HTTP responses.

use crate::baas::BaasError;
use crate::llm::LlmError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use healthymeal_shared::{ErrorCode, ErrorDetail, ErrorResponse};
use thiserror::Error;
use tracing::{error, warn};

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Email already registered: {0}")]
    EmailExists(String),

    /// Rejected by the BaaS auth API for a reason other than credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Too many requests: {message}")]
    TooManyRequests {
        message: String,
        retry_after_secs: u64,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// BaaS call failed while doing `context`
    #[error("{context}: {source}")]
    Baas {
        context: String,
        #[source]
        source: BaasError,
    },

    #[error("Recipe generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Wrap a BaaS failure with what was being attempted
    pub fn baas(context: impl Into<String>, source: BaasError) -> Self {
        ApiError::Baas {
            context: context.into(),
            source,
        }
    }

    /// Closure form of [`ApiError::baas`] for `map_err`
    pub fn baas_ctx(context: &'static str) -> impl FnOnce(BaasError) -> ApiError {
        move |source| ApiError::baas(context, source)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Validation(_) => ErrorCode::ValidationError,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::Unauthorized(_) => ErrorCode::Unauthorized,
            ApiError::Forbidden(_) => ErrorCode::Forbidden,
            ApiError::Conflict(_) => ErrorCode::Conflict,
            ApiError::EmailExists(_) => ErrorCode::EmailExists,
            ApiError::Auth(_) => ErrorCode::AuthError,
            ApiError::TooManyRequests { .. } => ErrorCode::RateLimited,
            ApiError::BadRequest(_) => ErrorCode::BadRequest,
            ApiError::Baas { source, .. } if source.is_auth_failure() => ErrorCode::Unauthorized,
            ApiError::Baas { .. } => ErrorCode::BaasError,
            ApiError::Generation(_) => ErrorCode::GenerationError,
            ApiError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<BaasError> for ApiError {
    fn from(source: BaasError) -> Self {
        ApiError::baas("Backend request failed", source)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let mut retry_after = None;

        let (status, message) = match &self {
            ApiError::Validation(msg)
            | ApiError::Auth(msg)
            | ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Conflict(msg) | ApiError::EmailExists(msg) => {
                (StatusCode::CONFLICT, msg.clone())
            }
            ApiError::TooManyRequests {
                message,
                retry_after_secs,
            } => {
                retry_after = Some(*retry_after_secs);
                (StatusCode::TOO_MANY_REQUESTS, message.clone())
            }
            ApiError::Baas { context, source } => {
                if source.is_auth_failure() {
                    warn!(context = %context, error = %source, "BaaS rejected session");
                    (
                        StatusCode::UNAUTHORIZED,
                        "Session expired or invalid".to_string(),
                    )
                } else {
                    error!(context = %context, error = ?source, "BaaS error");
                    let detail = match source {
                        BaasError::Api { message, .. } => message.clone(),
                        _ => "upstream service unavailable".to_string(),
                    };
                    (StatusCode::BAD_GATEWAY, format!("{}: {}", context, detail))
                }
            }
            ApiError::Generation(err) => {
                error!(error = ?err, "Recipe generation error");
                match err {
                    LlmError::Disabled => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
                    LlmError::Http(_) => (
                        StatusCode::BAD_GATEWAY,
                        "AI service is unreachable".to_string(),
                    ),
                    _ => (StatusCode::BAD_GATEWAY, err.to_string()),
                }
            }
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code,
                message,
                details: None,
            },
        });

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error_status() {
        let error = ApiError::Validation("Invalid input".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_error_status() {
        let error = ApiError::NotFound("Recipe not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unauthorized_error_status() {
        let error = ApiError::Unauthorized("Invalid token".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_email_exists_body() {
        let response = ApiError::EmailExists("Email already registered".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "EMAIL_EXISTS");
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::TooManyRequests {
            message: "Slow down".to_string(),
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[tokio::test]
    async fn test_baas_error_keeps_context() {
        let source = BaasError::from_body(400, r#"{"message":"violates check constraint"}"#);
        let response = ApiError::baas("Failed to fetch ingredients", source).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "BAAS_ERROR");
        assert_eq!(
            body["error"]["message"],
            "Failed to fetch ingredients: violates check constraint"
        );
    }

    #[test]
    fn test_baas_auth_failure_maps_to_401() {
        let source = BaasError::from_body(401, r#"{"message":"JWT expired"}"#);
        let error = ApiError::baas("Failed to fetch recipes", source);
        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert_eq!(error.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_disabled_generation_is_unavailable() {
        let response = ApiError::Generation(LlmError::Disabled).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

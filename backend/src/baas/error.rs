//! Errors returned by the BaaS client

use serde_json::Value;
use thiserror::Error;

/// Failure talking to the BaaS
#[derive(Error, Debug)]
pub enum BaasError {
    /// The BaaS answered with a non-success status
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("BaaS request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected BaaS response: {0}")]
    Decode(String),

    /// A single row was expected but none came back
    #[error("BaaS returned no rows")]
    EmptyResult,
}

impl BaasError {
    /// Build an `Api` error from a response body.
    ///
    /// Table errors carry `{code, message, details, hint}`; auth errors use
    /// one of `msg`, `error_description`, `message` or `error`.
    pub fn from_body(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();

        let message = parsed
            .as_ref()
            .and_then(|v| {
                ["msg", "error_description", "message", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(Value::as_str))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("BaaS request failed with status {}", status)
                } else {
                    trimmed.to_string()
                }
            });

        let code = parsed.as_ref().and_then(|v| {
            ["error_code", "code"]
                .iter()
                .find_map(|key| match v.get(*key) {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                })
        });

        BaasError::Api {
            status,
            code,
            message,
        }
    }

    /// HTTP status reported by the BaaS, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            BaasError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403 answers, i.e. an expired or rejected session
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// True when the auth API reports an already registered email
    pub fn is_already_registered(&self) -> bool {
        match self {
            BaasError::Api { code, message, .. } => {
                code.as_deref() == Some("user_already_exists")
                    || message.to_lowercase().contains("already registered")
            }
            _ => false,
        }
    }
}

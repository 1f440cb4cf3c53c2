//! HTTP client for the BaaS project
//!
//! One `reqwest::Client` is shared by the auth and table APIs. Every request
//! carries the project's anon key; table requests additionally carry the
//! caller's access token so row-level security is evaluated for that user.

use super::auth::AuthApi;
use super::error::BaasError;
use super::query::TableQuery;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct Inner {
    http: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
}

/// Shared BaaS client; cloning is an `Arc` increment
#[derive(Clone)]
pub struct BaasClient {
    inner: Arc<Inner>,
}

impl BaasClient {
    /// Create a client for the project at `base_url`
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, BaasError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("healthymeal-backend/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                anon_key: SecretString::new(anon_key.to_string()),
            }),
        })
    }

    /// Authentication endpoints
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Table access on behalf of the holder of `access_token`
    pub fn rest(&self, access_token: &str) -> RestClient {
        RestClient {
            client: self.clone(),
            token: Arc::new(SecretString::new(access_token.to_string())),
        }
    }

    /// Check that the REST endpoint answers
    pub async fn health_check(&self) -> Result<(), BaasError> {
        let response = self.request(Method::GET, "/rest/v1/").send().await?;
        check_status(response).await.map(|_| ())
    }

    /// Request builder for `path` with the project key attached
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, path);
        self.inner
            .http
            .request(method, url)
            .header("apikey", self.inner.anon_key.expose_secret())
    }

    /// Send a request, recording latency under `operation`
    pub(crate) async fn send(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
        target: &str,
    ) -> Result<Response, BaasError> {
        let started = Instant::now();
        let result = builder.send().await;
        let elapsed = started.elapsed();

        metrics::histogram!("healthymeal_baas_request_seconds", "operation" => operation)
            .record(elapsed.as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                metrics::counter!("healthymeal_baas_errors_total", "operation" => operation)
                    .increment(1);
                return Err(e.into());
            }
        };

        debug!(
            operation,
            target,
            status = response.status().as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "BaaS request"
        );

        let checked = check_status(response).await;
        if checked.is_err() {
            metrics::counter!("healthymeal_baas_errors_total", "operation" => operation)
                .increment(1);
        }
        checked
    }
}

/// Turn non-success responses into `BaasError::Api`
pub(crate) async fn check_status(response: Response) -> Result<Response, BaasError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BaasError::from_body(status.as_u16(), &body))
}

/// Decode a JSON response body
pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, BaasError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| BaasError::Decode(e.to_string()))
}

/// Table API bound to one user's access token
#[derive(Clone)]
pub struct RestClient {
    client: BaasClient,
    token: Arc<SecretString>,
}

impl RestClient {
    /// Start a query on `table`
    pub fn from(&self, table: &str) -> TableQuery {
        TableQuery::new(self.clone(), table)
    }

    pub(crate) fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, &format!("/rest/v1/{}", table))
            .bearer_auth(self.token.expose_secret())
    }

    pub(crate) fn client(&self) -> &BaasClient {
        &self.client
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.client.inner.base_url)
            .finish_non_exhaustive()
    }
}

use anyhow::Context;
use reqwest::{Client, Response, Url};
use std::time::Duration;

use crate::error::{ClientError, Result};

/// HTTP transport for the CoffeeCup API
///
/// Resolves relative paths against the configured base URL and keeps a
/// pooled `reqwest::Client` shared by token and data requests.
#[derive(Clone)]
pub struct HttpTransport {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// API root, always ending in `/`
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport with default pooling and timeouts
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_settings(base_url, 10, 10, 30)
    }

    /// Create a transport with explicit pool size and timeouts (seconds)
    pub fn with_settings(
        base_url: &str,
        max_connections: usize,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Resolve a path relative to the base URL
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Config(format!("Invalid request path '{}': {}", path, e)))
    }

    /// POST a form-urlencoded body
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> anyhow::Result<Response> {
        let url = self.url(path)?;

        tracing::debug!(url = %url, "Sending form POST");

        self.client
            .post(url)
            .form(form)
            .send()
            .await
            .context("Failed to send token request")
    }

    /// GET with an `Authorization` header
    pub async fn get(&self, path: &str, authorization: &str) -> Result<Response> {
        let url = self.url(path)?;

        tracing::debug!(url = %url, "Sending HTTP GET");

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection_failed"
                } else if e.is_request() {
                    "request_error"
                } else {
                    "unknown"
                };
                tracing::warn!(
                    error_kind = error_kind,
                    error = %e,
                    url = %url,
                    "HTTP request error"
                );
                ClientError::Transport(e)
            })?;

        tracing::debug!(status = %response.status(), "Received HTTP response");

        Ok(response)
    }

    /// The normalized base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// Parse the base URL and make sure relative joins keep its path prefix
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Config("base URL is empty".to_string()));
    }

    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };

    let url = Url::parse(&with_slash)
        .map_err(|e| ClientError::Config(format!("Invalid base URL '{}': {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "Unsupported URL scheme '{}' in base URL",
            other
        ))),
    }
}

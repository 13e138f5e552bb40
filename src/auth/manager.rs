use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, RwLock};

use super::grant;
use super::types::{Credentials, TokenState};
use crate::error::{ClientError, Result};
use crate::http_client::HttpTransport;

/// Token manager
/// Owns the token lifecycle for one credential set and performs the
/// authenticated requests that depend on it
pub struct TokenManager {
    /// Transport shared by token and data requests
    transport: HttpTransport,

    /// Account the tokens are issued for
    credentials: Credentials,

    /// Version segment prepended to data paths (e.g. `v1`)
    api_version: String,

    /// Current token data
    state: RwLock<TokenState>,

    /// Serializes acquisition and refresh so concurrent callers share one grant
    refresh_gate: Mutex<()>,

    /// Tokens are treated as expired this long before their real expiry
    expiry_margin: Duration,
}

impl TokenManager {
    /// Create a manager with an empty token state
    pub fn new(
        transport: HttpTransport,
        credentials: Credentials,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            credentials,
            api_version: api_version.into(),
            state: RwLock::new(TokenState::default()),
            refresh_gate: Mutex::new(()),
            expiry_margin: Duration::zero(),
        }
    }

    /// Refresh tokens `margin` before they actually expire
    pub fn with_expiry_margin(mut self, margin: std::time::Duration) -> Self {
        self.expiry_margin = Duration::from_std(margin).unwrap_or_else(|_| {
            tracing::warn!(
                margin_secs = margin.as_secs(),
                "Expiry margin out of range, refreshing only at real expiry"
            );
            Duration::zero()
        });
        self
    }

    /// Snapshot of the current token state
    pub async fn state(&self) -> TokenState {
        self.state.read().await.clone()
    }

    /// Get a `Bearer <token>` header value, acquiring a token if none is held
    /// or the held one has expired
    pub async fn ensure_auth_header(&self) -> Result<String> {
        self.credentials.validate()?;

        {
            let state = self.state.read().await;
            if state.is_valid(Utc::now()) {
                if let Some(token) = state.access_token() {
                    return Ok(bearer(token));
                }
            }
        }

        self.acquire().await
    }

    /// Run the refresh grant; `false` on any failure, state left untouched
    pub async fn refresh_token(&self) -> bool {
        self.try_refresh().await.is_ok()
    }

    /// Run the refresh grant, reporting why it failed
    pub async fn try_refresh(&self) -> Result<()> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// GET `{api_version}/{path}` with a valid token and parse the JSON body
    pub async fn authenticated_get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.credentials.validate()?;

        let (expired, can_refresh) = {
            let state = self.state.read().await;
            (
                state.is_expired(Utc::now()),
                state.refresh_token().is_some(),
            )
        };

        if expired {
            if can_refresh {
                self.refresh_if_expired().await?;
            } else {
                tracing::debug!("Token expired without refresh token, re-acquiring");
            }
        }

        let header = self.ensure_auth_header().await?;
        if header.is_empty() {
            return Err(ClientError::Auth(
                "Could not retrieve bearer token".to_string(),
            ));
        }

        let full_path = self.versioned_path(path);
        let response = self.transport.get(&full_path, &header).await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = %full_path, "CoffeeCup API rejected bearer token");
            return Err(ClientError::Auth(
                "Could not read data from CoffeeCup API due to authorization issues".to_string(),
            ));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                path = %full_path,
                response_body = %error_text,
                "CoffeeCup API request failed"
            );
            return Err(ClientError::Api {
                status: Some(status.as_u16()),
                message: error_text,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(path = %full_path, error = %e, "Failed to parse CoffeeCup response");
            ClientError::Api {
                status: None,
                message: format!("Failed to parse response from {}: {}", full_path, e),
            }
        })
    }

    /// Password grant, single-flight
    async fn acquire(&self) -> Result<String> {
        let _gate = self.refresh_gate.lock().await;

        // Another caller may have acquired while we waited for the gate
        {
            let state = self.state.read().await;
            if state.is_valid(Utc::now()) {
                if let Some(token) = state.access_token() {
                    tracing::debug!("Reusing token acquired by concurrent request");
                    return Ok(bearer(token));
                }
            }
        }

        match grant::request_password_grant(&self.transport, &self.credentials).await {
            Ok(result) => {
                let mut state = self.state.write().await;
                state.apply(result, Utc::now(), self.expiry_margin);
                let token = state.access_token().unwrap_or_default();
                tracing::debug!(
                    token_prefix = %token_prefix(token),
                    expires_at = ?state.expires_at(),
                    "Token acquired"
                );
                Ok(bearer(token))
            }
            Err(e) => {
                tracing::error!("Token acquisition failed: {:#}", e);
                Err(ClientError::Auth(format!("Token acquisition failed: {:#}", e)))
            }
        }
    }

    /// Refresh only if nobody else did while we waited for the gate
    async fn refresh_if_expired(&self) -> Result<()> {
        let _gate = self.refresh_gate.lock().await;

        if !self.state.read().await.is_expired(Utc::now()) {
            tracing::debug!("Token already refreshed by concurrent request");
            return Ok(());
        }

        self.refresh_locked().await
    }

    /// Refresh grant; caller must hold `refresh_gate`
    async fn refresh_locked(&self) -> Result<()> {
        let refresh_token = self
            .state
            .read()
            .await
            .refresh_token()
            .map(str::to_string)
            .ok_or_else(|| ClientError::AuthRefresh("No refresh token available".to_string()))?;

        let result =
            grant::request_refresh_grant(&self.transport, &self.credentials, &refresh_token)
                .await
                .map_err(|e| {
                    tracing::error!("Token refresh failed: {:#}", e);
                    ClientError::AuthRefresh(format!("{:#}", e))
                })?;

        let mut state = self.state.write().await;
        state.apply(result, Utc::now(), self.expiry_margin);
        tracing::debug!(expires_at = ?state.expires_at(), "Token refreshed");

        Ok(())
    }

    fn versioned_path(&self, path: &str) -> String {
        let version = self.api_version.trim_matches('/');
        let path = path.trim_start_matches('/');
        if version.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", version, path)
        }
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(username: &str, password: &str) -> TokenManager {
        // Port 9 (discard) is never contacted by these tests
        let transport = HttpTransport::new("http://127.0.0.1:9/").unwrap();
        TokenManager::new(
            transport,
            Credentials::new(username, password, "client-id", "client-secret"),
            "v1",
        )
    }

    #[tokio::test]
    async fn test_empty_username_fails_before_network() {
        let manager = manager("", "secret");
        let err = manager.ensure_auth_header().await.unwrap_err();
        assert!(matches!(err, ClientError::Credentials(_)));
        assert!(manager.state().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_password_fails_authenticated_get() {
        let manager = manager("jane", "");
        let err = manager
            .authenticated_get::<serde_json::Value>("clients")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Credentials(_)));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails() {
        let manager = manager("jane", "secret");
        assert!(!manager.refresh_token().await);

        let err = manager.try_refresh().await.unwrap_err();
        assert!(matches!(err, ClientError::AuthRefresh(_)));
        assert_eq!(manager.state().await, TokenState::default());
    }

    #[test]
    fn test_versioned_path() {
        let m = manager("jane", "secret");
        assert_eq!(m.versioned_path("clients"), "v1/clients");
        assert_eq!(m.versioned_path("/users"), "v1/users");

        let transport = HttpTransport::new("http://127.0.0.1:9/").unwrap();
        let m = TokenManager::new(
            transport,
            Credentials::new("jane", "secret", "id", "cs"),
            "/v2/",
        );
        assert_eq!(m.versioned_path("projects"), "v2/projects");
    }

    #[test]
    fn test_expiry_margin_builder() {
        let m = manager("jane", "secret").with_expiry_margin(std::time::Duration::from_secs(60));
        assert_eq!(m.expiry_margin, Duration::seconds(60));
    }

    #[test]
    fn test_expiry_margin_out_of_range_falls_back_to_zero() {
        let m = manager("jane", "secret").with_expiry_margin(std::time::Duration::MAX);
        assert_eq!(m.expiry_margin, Duration::zero());
    }

    #[test]
    fn test_token_prefix() {
        assert_eq!(token_prefix("abcdefghijkl"), "abcdefgh");
        assert_eq!(token_prefix("abc"), "abc");
    }
}

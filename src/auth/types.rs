// Authentication types

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Immutable credential set for one CoffeeCup account
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub client_id: String,
    pub client_secret: SecretString,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let password: String = password.into();
        let client_secret: String = client_secret.into();
        Self {
            username: username.into(),
            password: SecretString::from(password),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret),
        }
    }

    /// Username and password must both be present before any token request
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(ClientError::Credentials("username is empty".to_string()));
        }
        if self.password.expose_secret().is_empty() {
            return Err(ClientError::Credentials("password is empty".to_string()));
        }
        Ok(())
    }
}

/// Outcome of a password or refresh grant
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResult {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in_seconds: i64,
}

/// Cached token data owned by a `TokenManager`
///
/// `access_token` and `expires_at` are only ever written together through
/// [`TokenState::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
    }

    /// True once a token was obtained and `now` reached its expiry
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if now >= exp)
    }

    /// True when a token is held and not yet expired
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_empty() && !self.is_expired(now)
    }

    /// Store a grant result, expiring `margin` early
    ///
    /// The margin is capped at half the token lifetime so a short-lived token
    /// is never stored already expired.
    pub fn apply(&mut self, result: AuthResult, now: DateTime<Utc>, margin: Duration) {
        let lifetime =
            Duration::try_seconds(result.expires_in_seconds.max(0)).unwrap_or_else(Duration::zero);
        let margin = margin.max(Duration::zero()).min(lifetime / 2);
        let expires_at = now.checked_add_signed(lifetime - margin).unwrap_or(now);
        self.access_token = Some(result.access_token);
        // Keep the previous refresh token if the server did not rotate it
        if result.refresh_token.is_some() {
            self.refresh_token = result.refresh_token;
        }
        self.expires_at = Some(expires_at);
    }
}

/// Token endpoint response body
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

impl From<TokenResponse> for AuthResult {
    fn from(resp: TokenResponse) -> Self {
        Self {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            expires_in_seconds: resp.expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(token: &str, refresh: Option<&str>, expires_in: i64) -> AuthResult {
        AuthResult {
            access_token: token.to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_in_seconds: expires_in,
        }
    }

    #[test]
    fn test_empty_state_is_not_expired() {
        let state = TokenState::default();
        assert!(state.is_empty());
        assert!(!state.is_expired(Utc::now()));
        assert!(!state.is_valid(Utc::now()));
    }

    #[test]
    fn test_apply_sets_token_and_expiry_together() {
        let now = Utc::now();
        let mut state = TokenState::default();
        state.apply(result("A", Some("R"), 3600), now, Duration::zero());

        assert_eq!(state.access_token(), Some("A"));
        assert_eq!(state.refresh_token(), Some("R"));
        assert_eq!(state.expires_at(), Some(now + Duration::seconds(3600)));
        assert!(state.is_valid(now + Duration::seconds(3599)));
        assert!(state.is_expired(now + Duration::seconds(3600)));
    }

    #[test]
    fn test_apply_with_margin_expires_early() {
        let now = Utc::now();
        let mut state = TokenState::default();
        state.apply(result("A", Some("R"), 3600), now, Duration::seconds(60));

        assert!(state.is_expired(now + Duration::seconds(3540)));
        assert!(state.is_valid(now + Duration::seconds(3539)));
    }

    #[test]
    fn test_margin_capped_for_short_lived_token() {
        let now = Utc::now();
        let mut state = TokenState::default();
        state.apply(result("A", Some("R"), 30), now, Duration::seconds(60));

        assert_eq!(state.expires_at(), Some(now + Duration::seconds(15)));
        assert!(state.is_valid(now));
    }

    #[test]
    fn test_apply_zero_lifetime_is_expired() {
        let now = Utc::now();
        let mut state = TokenState::default();
        state.apply(result("A", Some("R"), 0), now, Duration::seconds(60));

        assert_eq!(state.expires_at(), Some(now));
        assert!(state.is_expired(now));
    }

    #[test]
    fn test_apply_out_of_range_lifetime_does_not_panic() {
        let now = Utc::now();
        let mut state = TokenState::default();
        state.apply(result("A", Some("R"), i64::MAX), now, Duration::zero());

        assert_eq!(state.access_token(), Some("A"));
        assert!(state.expires_at().is_some());
    }

    #[test]
    fn test_apply_keeps_refresh_token_when_not_rotated() {
        let now = Utc::now();
        let mut state = TokenState::default();
        state.apply(result("A", Some("R"), 3600), now, Duration::zero());
        state.apply(result("B", None, 3600), now, Duration::zero());

        assert_eq!(state.access_token(), Some("B"));
        assert_eq!(state.refresh_token(), Some("R"));
    }

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new("jane", "secret", "id", "cs").validate().is_ok());

        let err = Credentials::new("", "secret", "id", "cs").validate().unwrap_err();
        assert!(matches!(err, ClientError::Credentials(_)));

        let err = Credentials::new("jane", "", "id", "cs").validate().unwrap_err();
        assert!(matches!(err, ClientError::Credentials(_)));

        // Same rule for both fields: only the empty string is rejected
        assert!(Credentials::new(" ", "secret", "id", "cs").validate().is_ok());
        assert!(Credentials::new("jane", " ", "id", "cs").validate().is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials::new("jane", "hunter2", "id", "top-secret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("jane"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("top-secret"));
    }

    #[test]
    fn test_token_response_parsing() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{"access_token":"A","refresh_token":"R","expires_in":3600,"token_type":"Bearer"}"#,
        )
        .unwrap();
        let result = AuthResult::from(resp);
        assert_eq!(result.access_token, "A");
        assert_eq!(result.refresh_token.as_deref(), Some("R"));
        assert_eq!(result.expires_in_seconds, 3600);
    }
}

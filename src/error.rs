// Error handling module
// Defines the error taxonomy surfaced by the client

use thiserror::Error;

/// Errors that can occur while talking to the CoffeeCup API
#[derive(Error, Debug)]
pub enum ClientError {
    /// Username or password missing
    #[error("Invalid CoffeeCup credentials: {0}")]
    Credentials(String),

    /// No token obtainable, or the API rejected the token (401)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Refresh grant failed
    #[error("Could not refresh authentication token: {0}")]
    AuthRefresh(String),

    /// Non-2xx response (other than 401) or unparsable payload
    #[error("{}", format_api_error(.status, .message))]
    Api { status: Option<u16>, message: String },

    /// Network failure on a data request
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

fn format_api_error(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("CoffeeCup API error: {} - {}", code, message),
        None => format!("CoffeeCup API error: {}", message),
    }
}

impl ClientError {
    /// HTTP status carried by an `Api` error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => *status,
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Caller should ask for credentials again
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            ClientError::Credentials(_) | ClientError::Auth(_) | ClientError::AuthRefresh(_)
        )
    }

    /// Transient upstream issue, safe to retry later
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Api { .. } | ClientError::Transport(_))
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

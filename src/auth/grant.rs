// OAuth2 token grants against the CoffeeCup token endpoint

use anyhow::{Context, Result};
use secrecy::ExposeSecret;

use super::types::{AuthResult, Credentials, TokenResponse};
use crate::http_client::HttpTransport;

/// Token endpoint, relative to the API root (not versioned)
pub const TOKEN_PATH: &str = "oauth2/token";

/// Longest token lifetime accepted from the server (one year)
pub const MAX_EXPIRES_IN_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Acquire a token with the resource owner password grant
pub async fn request_password_grant(
    transport: &HttpTransport,
    creds: &Credentials,
) -> Result<AuthResult> {
    tracing::info!(username = %creds.username, "Requesting CoffeeCup token via password grant...");

    let form = [
        ("grant_type", "password"),
        ("username", creds.username.as_str()),
        ("password", creds.password.expose_secret()),
        ("client_id", creds.client_id.as_str()),
        ("client_secret", creds.client_secret.expose_secret()),
    ];

    request_token(transport, "password", &form).await
}

/// Exchange a refresh token for a new access token
pub async fn request_refresh_grant(
    transport: &HttpTransport,
    creds: &Credentials,
    refresh_token: &str,
) -> Result<AuthResult> {
    tracing::info!("Refreshing CoffeeCup token via refresh_token grant...");

    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", creds.client_id.as_str()),
        ("client_secret", creds.client_secret.expose_secret()),
    ];

    request_token(transport, "refresh_token", &form).await
}

async fn request_token(
    transport: &HttpTransport,
    grant_type: &str,
    form: &[(&str, &str)],
) -> Result<AuthResult> {
    let response = transport.post_form(TOKEN_PATH, form).await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();

        // OAuth2 servers report `error` / `error_description` on failure
        if let Ok(error_json) = serde_json::from_str::<serde_json::Value>(&error_text) {
            if let Some(error_code) = error_json.get("error").and_then(|v| v.as_str()) {
                tracing::error!(
                    grant_type = grant_type,
                    error = error_code,
                    description = error_json
                        .get("error_description")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default(),
                    "Token endpoint rejected grant"
                );
            }
        }

        anyhow::bail!("{} grant failed: {} - {}", grant_type, status, error_text);
    }

    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read {} grant response", grant_type))?;

    let data: TokenResponse = serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse {} grant response", grant_type))?;

    if data.access_token.is_empty() {
        anyhow::bail!("{} grant response does not contain access_token", grant_type);
    }

    if !(0..=MAX_EXPIRES_IN_SECONDS).contains(&data.expires_in) {
        anyhow::bail!(
            "{} grant response has out-of-range expires_in: {}",
            grant_type,
            data.expires_in
        );
    }

    tracing::info!(
        grant_type = grant_type,
        expires_in = data.expires_in,
        "Token received from CoffeeCup"
    );

    Ok(data.into())
}

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use coffeecup_client::auth::{Credentials, TokenManager};
use coffeecup_client::config::{Command, Config};
use coffeecup_client::http_client::HttpTransport;
use coffeecup_client::query::QueryService;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = Config::load()?;
    config.validate()?;

    // Initialize logging with the configured level; RUST_LOG wins if set
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::debug!(
        base_url = %config.base_url,
        api_version = %config.api_version,
        "CoffeeCup client starting"
    );

    let transport = HttpTransport::with_settings(
        &config.base_url,
        config.http_max_connections,
        config.http_connect_timeout,
        config.http_request_timeout,
    )?;

    let credentials = Credentials::new(
        config.username.clone(),
        config.password.clone(),
        config.client_id.clone(),
        config.client_secret.clone(),
    );

    let tokens = Arc::new(
        TokenManager::new(transport, credentials, config.api_version.clone())
            .with_expiry_margin(Duration::from_secs(config.token_expiry_margin)),
    );
    let queries = QueryService::new(tokens);

    if let Err(e) = run(&queries, command).await {
        if e.requires_reauthentication() {
            tracing::error!("Check COFFEECUP_USERNAME / COFFEECUP_PASSWORD and the OAuth client settings");
        } else if e.is_retryable() {
            tracing::error!("CoffeeCup API is unavailable, try again later");
        }
        return Err(e).context("CoffeeCup query failed");
    }

    Ok(())
}

async fn run(queries: &QueryService, command: Command) -> coffeecup_client::Result<()> {
    match command {
        Command::Clients => print_json(&queries.get_clients().await?),
        Command::Projects => print_json(&queries.get_projects().await?),
        Command::TimeEntries { day, from, to } => {
            let entries = match (day, from, to) {
                (Some(day), _, _) => queries.get_time_entries_by_day(day).await?,
                (None, Some(from), Some(to)) => {
                    queries.get_time_entries_by_day_range(from, to).await?
                }
                _ => queries.get_time_entries().await?,
            };
            print_json(&entries)
        }
        Command::Users { all, simple } => {
            if simple {
                print_json(&queries.get_users_simple(!all).await?)
            } else {
                print_json(&queries.get_users(!all).await?)
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> coffeecup_client::Result<()> {
    let out = serde_json::to_string_pretty(value).map_err(|e| coffeecup_client::ClientError::Api {
        status: None,
        message: format!("Failed to serialize output: {}", e),
    })?;
    println!("{}", out);
    Ok(())
}

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use reqwest::Url;

/// CoffeeCup API client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// CoffeeCup API base URL
    #[arg(short = 'b', long, env = "COFFEECUP_BASE_URL")]
    pub base_url: Option<String>,

    /// API version segment prepended to data paths
    #[arg(long, env = "COFFEECUP_API_VERSION", default_value = "v1")]
    pub api_version: String,

    /// OAuth client id
    #[arg(long, env = "COFFEECUP_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "COFFEECUP_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// CoffeeCup username
    #[arg(short = 'u', long, env = "COFFEECUP_USERNAME")]
    pub username: Option<String>,

    /// CoffeeCup password
    #[arg(long, env = "COFFEECUP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Resource to retrieve
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List clients
    Clients,
    /// List projects
    Projects,
    /// List time entries, optionally filtered by day
    TimeEntries {
        /// Entries from this day onwards (YYYY-MM-DD)
        #[arg(long, conflicts_with_all = ["from", "to"])]
        day: Option<NaiveDate>,
        /// Start of an inclusive day range (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// End of an inclusive day range (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// List users
    Users {
        /// Include users that are not currently valid
        #[arg(long)]
        all: bool,
        /// Print the simplified user view
        #[arg(long)]
        simple: bool,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    // API
    pub base_url: String,
    pub api_version: String,

    // OAuth client
    pub client_id: String,
    pub client_secret: String,

    // Account
    pub username: String,
    pub password: String,

    // Token handling
    pub token_expiry_margin: u64,

    // HTTP client
    pub http_max_connections: usize,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Logging
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<(Self, Command)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let command = args.command.clone();
        Ok((Self::from_args(args)?, command))
    }

    /// Build configuration from parsed arguments and the environment
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Config {
            base_url: args
                .base_url
                .context("COFFEECUP_BASE_URL is required (use -b or set COFFEECUP_BASE_URL)")?,
            api_version: args.api_version,

            client_id: args
                .client_id
                .context("COFFEECUP_CLIENT_ID is required (use --client-id or set COFFEECUP_CLIENT_ID)")?,
            client_secret: args.client_secret.context(
                "COFFEECUP_CLIENT_SECRET is required (use --client-secret or set COFFEECUP_CLIENT_SECRET)",
            )?,

            username: args
                .username
                .context("COFFEECUP_USERNAME is required (use -u or set COFFEECUP_USERNAME)")?,
            password: args
                .password
                .context("COFFEECUP_PASSWORD is required (use --password or set COFFEECUP_PASSWORD)")?,

            token_expiry_margin: env_or("TOKEN_EXPIRY_MARGIN", 60),

            http_max_connections: env_or("HTTP_MAX_CONNECTIONS", 10),
            http_connect_timeout: env_or("HTTP_CONNECT_TIMEOUT", 10),
            http_request_timeout: args.http_timeout,

            log_level: args.log_level,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("COFFEECUP_BASE_URL is not a valid URL: {}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("COFFEECUP_BASE_URL must use http or https: {}", self.base_url);
        }

        for (name, value) in [
            ("COFFEECUP_CLIENT_ID", &self.client_id),
            ("COFFEECUP_CLIENT_SECRET", &self.client_secret),
            ("COFFEECUP_USERNAME", &self.username),
            ("COFFEECUP_PASSWORD", &self.password),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }

        if self.http_request_timeout == 0 {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than zero");
        }

        Ok(())
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

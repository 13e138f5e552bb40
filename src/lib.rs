// CoffeeCup client - Library root

pub mod auth;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod query;

pub use auth::{Credentials, TokenManager};
pub use error::{ClientError, Result};
pub use query::QueryService;

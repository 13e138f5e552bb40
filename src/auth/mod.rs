// Authentication module
// Manages the OAuth2 token lifecycle for the CoffeeCup API

mod grant;
mod manager;
mod types;

pub use grant::TOKEN_PATH;
pub use manager::TokenManager;
pub use types::{AuthResult, Credentials, TokenState};

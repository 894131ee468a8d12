//! OAuth module
//!
//! Provider client, CSRF state handling and the data exchanged with the
//! identity provider during a login attempt.

pub mod client;
pub mod error;
pub mod state;
pub mod types;

pub use client::{GitHubOAuthClient, IdentityProviderClient};
pub use error::ProviderError;
pub use state::{StateTokenGuard, STATE_SESSION_KEY};
pub use types::{OAuthCallback, ProviderConnection, ProviderToken, RemoteIdentity};

#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the idlink application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod accounts;
pub mod authentication;
pub mod handlers;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use accounts::{AccountStore, IdentityLinker, InMemoryAccountStore};
pub use authentication::{
    AuthOutcome, AuthenticationFlow, AuthenticationServiceFactory, Principal, RejectReason,
};
pub use handlers::configure_services;
pub use oauth::{GitHubOAuthClient, IdentityProviderClient, StateTokenGuard};
pub use session::{InMemorySessionStore, SessionId, SessionStore};
pub use settings::IdlinkSettings;

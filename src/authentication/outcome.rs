//! Terminal results of a login attempt

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::oauth::ProviderError;

/// Identity handed to the host once a login succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
}

impl Principal {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Why a callback request was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Missing or mismatched CSRF state token
    InvalidState,
    /// No active provider connection
    NotConfigured,
    ProviderExchange,
    ProviderProfile,
    /// Provisioning collided with an unrelated account of this name
    UsernameConflict(String),
    AccountStore,
}

impl RejectReason {
    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidState => "invalid_state",
            Self::NotConfigured => "not_configured",
            Self::ProviderExchange => "provider_exchange_failed",
            Self::ProviderProfile => "provider_profile_failed",
            Self::UsernameConflict(_) => "username_conflict",
            Self::AccountStore => "account_store_failed",
        }
    }

    /// Message safe to show to the user
    ///
    /// Never contains provider payloads or the supplied state value. Only a
    /// username conflict names the colliding username.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidState => {
                "GitHub login error: 'state' parameter is missing or invalid".to_string()
            }
            Self::NotConfigured => "GitHub login is not configured on this server".to_string(),
            Self::ProviderExchange | Self::ProviderProfile | Self::AccountStore => {
                "GitHub login failed, please start the login again".to_string()
            }
            Self::UsernameConflict(username) => {
                format!("User with username '{username}' already exists")
            }
        }
    }
}

/// Result of processing one callback request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The request is not a provider callback; other handlers may take it
    NotApplicable,
    Authenticated(Principal),
    Rejected(RejectReason),
}

impl AuthOutcome {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Failures of starting a login
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("GitHub login is not configured")]
    NotConfigured,

    #[error("Failed to build the authorization redirect: {0}")]
    Redirect(#[from] ProviderError),
}

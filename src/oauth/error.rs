//! Identity provider error types

use thiserror::Error;

/// Failures of the outbound provider calls
///
/// The carried message is diagnostic only and must not be shown to end users.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Code-for-token exchange failed (network, non-2xx, or malformed payload)
    #[error("Token exchange failed: {0}")]
    Exchange(String),

    /// Fetching the current user's profile failed
    #[error("Profile request failed: {0}")]
    Profile(String),

    /// Endpoints or HTTP client could not be set up from settings
    #[error("Invalid provider configuration: {0}")]
    Configuration(String),
}

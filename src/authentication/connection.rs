//! Lookup of the active provider connection

use crate::oauth::ProviderConnection;
use crate::settings::GitHubSettings;

/// Source of the client credentials used for the provider
pub trait ConnectionProvider: Send + Sync {
    /// The active connection, or `None` if login is disabled or unconfigured
    fn active_connection(&self) -> Option<ProviderConnection>;
}

/// Connection taken from the `[github]` settings section
///
/// A connection is active only while GitHub login is enabled and both the
/// client id and secret resolve to non-empty values.
#[derive(Debug, Clone)]
pub struct SettingsConnectionProvider {
    github: GitHubSettings,
}

impl SettingsConnectionProvider {
    #[must_use]
    pub fn new(github: GitHubSettings) -> Self {
        Self { github }
    }
}

impl ConnectionProvider for SettingsConnectionProvider {
    fn active_connection(&self) -> Option<ProviderConnection> {
        if !self.github.enabled {
            return None;
        }
        self.github
            .connection_credentials()
            .map(|(client_id, client_secret)| ProviderConnection::new(client_id, client_secret))
    }
}

//! Service factory for wiring the login flow from configuration

use crate::accounts::AccountStore;
use crate::authentication::connection::{ConnectionProvider, SettingsConnectionProvider};
use crate::authentication::flow::{AuthenticationFlow, FlowConfig};
use crate::oauth::{GitHubOAuthClient, ProviderError};
use crate::session::SessionStore;
use crate::settings::IdlinkSettings;
use std::sync::Arc;

/// Factory for creating the authentication flow with its collaborators
pub struct AuthenticationServiceFactory;

impl AuthenticationServiceFactory {
    /// Create a fully configured [`AuthenticationFlow`] talking to GitHub
    ///
    /// The session and account stores are supplied by the host so that it
    /// can share them with its own handlers.
    ///
    /// # Errors
    ///
    /// Returns an error if the GitHub endpoints are not valid URLs or the HTTP
    /// client cannot be built
    pub fn create_flow(
        settings: &IdlinkSettings,
        sessions: Arc<dyn SessionStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Result<AuthenticationFlow, ProviderError> {
        log::info!("🏭 Starting authentication service factory...");

        let provider = Arc::new(GitHubOAuthClient::from_settings(&settings.github)?);
        let connections = Arc::new(SettingsConnectionProvider::new(settings.github.clone()));
        for line in Self::connection_summary(settings, connections.as_ref()) {
            log::info!("{line}");
        }

        let flow = AuthenticationFlow::new(
            connections,
            provider,
            sessions,
            accounts,
            FlowConfig::from_settings(settings),
        );

        log::info!("🏭 Authentication service factory completed successfully");
        Ok(flow)
    }

    /// Startup summary of the GitHub connection
    ///
    /// Missing credentials are reported by [`IdlinkSettings::validate`], so
    /// that case adds nothing here.
    fn connection_summary(
        settings: &IdlinkSettings,
        connections: &dyn ConnectionProvider,
    ) -> Vec<String> {
        if !settings.github.enabled {
            vec!["⚠️  GitHub login is disabled".to_string()]
        } else if connections.active_connection().is_some() {
            vec![
                "✅ GitHub login configured".to_string(),
                format!("   └─ Callback: {}", settings.callback_url()),
                format!("   └─ Scope: {}", settings.github.scope),
            ]
        } else {
            Vec::new()
        }
    }
}

//! Test fixtures providing pre-built test objects

use crate::authentication::FlowConfig;
use crate::oauth::{ProviderConnection, ProviderToken, RemoteIdentity};
use crate::settings::{ApplicationSettings, GitHubSettings, IdlinkSettings, SessionSettings};

use super::constants::{
    TEST_ACCESS_TOKEN, TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_LOGIN_NAME, TEST_PROVIDER_USER_ID,
    TEST_ROOT_URL,
};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Settings with GitHub login enabled and configured, insecure cookies
    #[must_use]
    pub fn settings() -> IdlinkSettings {
        IdlinkSettings {
            application: ApplicationSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                root_url: TEST_ROOT_URL.to_string(),
            },
            github: Self::github_settings(),
            session: SessionSettings {
                cookie_secure: false,
                single_use_state: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[must_use]
    pub fn github_settings() -> GitHubSettings {
        GitHubSettings {
            enabled: true,
            client_id: Some(TEST_CLIENT_ID.to_string()),
            client_secret: Some(TEST_CLIENT_SECRET.to_string()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn flow_config() -> FlowConfig {
        FlowConfig::from_settings(&Self::settings())
    }

    #[must_use]
    pub fn connection() -> ProviderConnection {
        ProviderConnection::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
    }

    #[must_use]
    pub fn provider_token() -> ProviderToken {
        ProviderToken {
            access_token: TEST_ACCESS_TOKEN.to_string(),
            token_type: "bearer".to_string(),
            scope: "repo,user".to_string(),
        }
    }

    #[must_use]
    pub fn remote_identity() -> RemoteIdentity {
        RemoteIdentity::new(TEST_PROVIDER_USER_ID, TEST_LOGIN_NAME)
    }
}

//! Data carried through a GitHub login attempt

use serde::Deserialize;
use std::fmt;

/// OAuth callback structure for handling redirects from the identity provider
#[derive(Deserialize, Debug, Default, Clone)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Client credentials of the configured provider connection
#[derive(Clone)]
pub struct ProviderConnection {
    pub client_id: String,
    pub client_secret: String,
}

impl ProviderConnection {
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ProviderConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConnection")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Access token returned by the provider's token endpoint
///
/// `Debug` never prints the raw token; use [`ProviderToken::describe`] for logs.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ProviderToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

impl ProviderToken {
    /// Scopes actually granted by the user, split on GitHub's comma separator
    #[must_use]
    pub fn granted_scopes(&self) -> Vec<&str> {
        self.scope
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Summarize the token for diagnostics
    ///
    /// Shows the token type, the number of granted scopes and the token length.
    /// The first four characters are shown only for tokens longer than eight
    /// characters, so a short token is never printed whole.
    #[must_use]
    pub fn describe(&self) -> String {
        let length = self.access_token.chars().count();
        let prefix: String = if length > 8 {
            self.access_token.chars().take(4).collect()
        } else {
            String::new()
        };
        format!(
            "token_type={}, scopes=[{} scope(s)], access_token={prefix}**** ({length} chars)",
            if self.token_type.is_empty() { "unknown" } else { &self.token_type },
            self.granted_scopes().len()
        )
    }
}

impl fmt::Debug for ProviderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderToken({})", self.describe())
    }
}

/// Identity of the remote user as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIdentity {
    /// Stable, provider-assigned id; the only valid link key
    pub provider_user_id: String,
    /// Login name, used as the username hint when provisioning
    pub login_name: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl RemoteIdentity {
    #[must_use]
    pub fn new(provider_user_id: impl Into<String>, login_name: impl Into<String>) -> Self {
        Self {
            provider_user_id: provider_user_id.into(),
            login_name: login_name.into(),
            display_name: None,
            email: None,
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        format!("login '{}' (id: {})", self.login_name, self.provider_user_id)
    }
}

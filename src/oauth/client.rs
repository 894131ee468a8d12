//! Outbound calls to the identity provider
//!
//! [`IdentityProviderClient`] is the seam the login flow talks through;
//! [`GitHubOAuthClient`] is the production implementation on top of `reqwest`.
//! None of the calls retry: an authorization code is single-use, so a failed
//! or timed-out exchange ends the login attempt.

use crate::oauth::error::ProviderError;
use crate::oauth::types::{ProviderConnection, ProviderToken, RemoteIdentity};
use crate::settings::GitHubSettings;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Outbound interface to the identity provider
#[async_trait]
pub trait IdentityProviderClient: Send + Sync {
    /// Build the browser redirect to the provider's authorization endpoint.
    /// Pure construction, no network call.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization endpoint is not a valid URL
    fn build_authorization_redirect(
        &self,
        client_id: &str,
        scope: &str,
        callback_url: &str,
        state: &str,
    ) -> Result<Url, ProviderError>;

    /// Exchange an authorization code for an access token (one round trip)
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Exchange`] on network failure, non-2xx status,
    /// or a payload without an access token
    async fn exchange_code_for_token(
        &self,
        code: &str,
        connection: &ProviderConnection,
        callback_url: &str,
    ) -> Result<ProviderToken, ProviderError>;

    /// Fetch the profile of the user owning `access_token` (one round trip)
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Profile`] on network failure, non-2xx status,
    /// or a malformed profile payload
    async fn fetch_profile(&self, access_token: &str) -> Result<RemoteIdentity, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct GitHubTokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    scope: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

/// GitHub implementation of [`IdentityProviderClient`]
#[derive(Clone)]
pub struct GitHubOAuthClient {
    http_client: reqwest::Client,
    authorization_endpoint: Url,
    token_endpoint: Url,
    user_endpoint: Url,
}

impl GitHubOAuthClient {
    /// Create a client from the GitHub settings section
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is not a valid URL, the timeout is zero,
    /// or the HTTP client cannot be constructed
    pub fn from_settings(settings: &GitHubSettings) -> Result<Self, ProviderError> {
        let parse = |name: &str, value: &str| {
            Url::parse(value)
                .map_err(|e| ProviderError::Configuration(format!("{name} '{value}': {e}")))
        };

        // A zero timeout would fail every exchange
        if settings.timeout_seconds == 0 {
            return Err(ProviderError::Configuration(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(concat!("idlink/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            authorization_endpoint: parse(
                "authorization_endpoint",
                &settings.authorization_endpoint,
            )?,
            token_endpoint: parse("token_endpoint", &settings.token_endpoint)?,
            user_endpoint: parse("user_endpoint", &settings.user_endpoint)?,
        })
    }
}

#[async_trait]
impl IdentityProviderClient for GitHubOAuthClient {
    fn build_authorization_redirect(
        &self,
        client_id: &str,
        scope: &str,
        callback_url: &str,
        state: &str,
    ) -> Result<Url, ProviderError> {
        let mut url = self.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", callback_url)
            .append_pair("scope", scope)
            .append_pair("state", state);
        Ok(url)
    }

    async fn exchange_code_for_token(
        &self,
        code: &str,
        connection: &ProviderConnection,
        callback_url: &str,
    ) -> Result<ProviderToken, ProviderError> {
        let params = [
            ("client_id", connection.client_id.as_str()),
            ("client_secret", connection.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", callback_url),
        ];

        let response = self
            .http_client
            .post(self.token_endpoint.clone())
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Exchange(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Exchange(format!(
                "token endpoint answered with status {status}"
            )));
        }

        let body: GitHubTokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Exchange(format!("malformed token response: {e}")))?;

        // GitHub reports a bad or expired code with 200 and an `error` field
        if let Some(error) = body.error {
            let description = body.error_description.unwrap_or_default();
            return Err(ProviderError::Exchange(format!(
                "provider rejected the code: {error} {description}"
            )));
        }

        match body.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(ProviderToken {
                access_token,
                token_type: body.token_type.unwrap_or_default(),
                scope: body.scope.unwrap_or_default(),
            }),
            _ => Err(ProviderError::Exchange(
                "token response carried no access token".to_string(),
            )),
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<RemoteIdentity, ProviderError> {
        let response = self
            .http_client
            .get(self.user_endpoint.clone())
            .header(ACCEPT, "application/vnd.github+json")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Profile(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Profile(format!(
                "user endpoint answered with status {status}"
            )));
        }

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| ProviderError::Profile(format!("malformed user response: {e}")))?;

        if user.login.is_empty() {
            return Err(ProviderError::Profile(
                "user response carried an empty login".to_string(),
            ));
        }

        Ok(RemoteIdentity {
            provider_user_id: user.id.to_string(),
            login_name: user.login,
            display_name: user.name,
            email: user.email,
        })
    }
}

//! Fake collaborators for isolated testing of the login flow

use async_trait::async_trait;
use log::{Level, Log, Metadata, Record};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use url::Url;

use crate::accounts::{AccountRef, AccountStore, AccountStoreError, Provisioning};
use crate::authentication::ConnectionProvider;
use crate::oauth::{
    IdentityProviderClient, ProviderConnection, ProviderError, ProviderToken, RemoteIdentity,
};

use super::fixtures::TestFixtures;

/// Scripted identity provider that counts its outbound calls
pub struct FakeIdentityProvider {
    token: Result<ProviderToken, String>,
    identity: Result<RemoteIdentity, String>,
    exchange_calls: AtomicUsize,
    profile_calls: AtomicUsize,
    last_code: Mutex<Option<String>>,
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeIdentityProvider {
    /// Provider answering with the fixture token and identity (`42` / `alice`)
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: Ok(TestFixtures::provider_token()),
            identity: Ok(TestFixtures::remote_identity()),
            exchange_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            last_code: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_identity(mut self, provider_user_id: &str, login_name: &str) -> Self {
        self.identity = Ok(RemoteIdentity::new(provider_user_id, login_name));
        self
    }

    #[must_use]
    pub fn failing_exchange(mut self, reason: &str) -> Self {
        self.token = Err(reason.to_string());
        self
    }

    #[must_use]
    pub fn failing_profile(mut self, reason: &str) -> Self {
        self.identity = Err(reason.to_string());
        self
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    /// Authorization code passed to the most recent exchange
    pub fn last_code(&self) -> Option<String> {
        self.last_code
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl IdentityProviderClient for FakeIdentityProvider {
    fn build_authorization_redirect(
        &self,
        client_id: &str,
        scope: &str,
        callback_url: &str,
        state: &str,
    ) -> Result<Url, ProviderError> {
        Url::parse_with_params(
            "https://github.example/login/oauth/authorize",
            &[
                ("client_id", client_id),
                ("redirect_uri", callback_url),
                ("scope", scope),
                ("state", state),
            ],
        )
        .map_err(|e| ProviderError::Configuration(e.to_string()))
    }

    async fn exchange_code_for_token(
        &self,
        code: &str,
        _connection: &ProviderConnection,
        _callback_url: &str,
    ) -> Result<ProviderToken, ProviderError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_code.lock().unwrap_or_else(PoisonError::into_inner) = Some(code.to_string());
        self.token.clone().map_err(ProviderError::Exchange)
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<RemoteIdentity, ProviderError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.identity.clone().map_err(ProviderError::Profile)
    }
}

/// Connection provider with a fixed answer
pub struct StaticConnectionProvider(Option<ProviderConnection>);

impl StaticConnectionProvider {
    #[must_use]
    pub fn configured() -> Self {
        Self(Some(TestFixtures::connection()))
    }

    #[must_use]
    pub fn unconfigured() -> Self {
        Self(None)
    }
}

impl ConnectionProvider for StaticConnectionProvider {
    fn active_connection(&self) -> Option<ProviderConnection> {
        self.0.clone()
    }
}

/// Account store whose every operation fails
pub struct FailingAccountStore;

#[async_trait]
impl AccountStore for FailingAccountStore {
    async fn find_by_provider_id(
        &self,
        _provider_user_id: &str,
    ) -> Result<Option<AccountRef>, AccountStoreError> {
        Err(AccountStoreError::Backend("database unavailable".to_string()))
    }

    async fn create_account(
        &self,
        _login_name: &str,
        _provider_user_id: &str,
    ) -> Result<Provisioning, AccountStoreError> {
        Err(AccountStoreError::Backend("database unavailable".to_string()))
    }

    async fn record_token_association(
        &self,
        _account: &AccountRef,
        _login_name: &str,
        _token: &ProviderToken,
    ) -> Result<(), AccountStoreError> {
        Err(AccountStoreError::Backend("database unavailable".to_string()))
    }
}

/// `log` sink that keeps every record in memory
#[derive(Default)]
pub struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl CapturingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|(_, message)| message).collect()
    }

    /// Whether any captured message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|message| message.contains(needle))
    }
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

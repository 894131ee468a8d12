//! Login orchestration
//!
//! A login attempt moves through these stages:
//!
//! ```text
//! Started -> StateChecked -> CodeExchanged -> ProfileFetched -> Linked -> Done
//! ```
//!
//! Any failing stage ends the attempt with [`AuthOutcome::Rejected`]. A
//! request without an authorization code never enters the flow and yields
//! [`AuthOutcome::NotApplicable`].

use std::sync::Arc;
use url::Url;

use crate::accounts::{AccountStore, AccountStoreError, IdentityLinker};
use crate::authentication::connection::ConnectionProvider;
use crate::authentication::outcome::{AuthOutcome, FlowError, Principal, RejectReason};
use crate::oauth::{IdentityProviderClient, StateTokenGuard};
use crate::session::{SessionId, SessionStore};
use crate::settings::IdlinkSettings;
use crate::utils::logging::AuthLogger;

/// Static parameters of the flow
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Scope requested on every authorization redirect
    pub scope: String,
    /// Absolute URL of the callback endpoint
    pub callback_url: String,
    /// Discard the state token after the first callback that checks it
    pub single_use_state: bool,
}

impl FlowConfig {
    #[must_use]
    pub fn from_settings(settings: &IdlinkSettings) -> Self {
        Self {
            scope: settings.github.scope.clone(),
            callback_url: settings.callback_url(),
            single_use_state: settings.session.single_use_state,
        }
    }
}

#[derive(Clone)]
pub struct AuthenticationFlow {
    connections: Arc<dyn ConnectionProvider>,
    provider: Arc<dyn IdentityProviderClient>,
    state_guard: StateTokenGuard,
    accounts: Arc<dyn AccountStore>,
    linker: IdentityLinker,
    config: FlowConfig,
    logger: AuthLogger,
}

impl AuthenticationFlow {
    #[must_use]
    pub fn new(
        connections: Arc<dyn ConnectionProvider>,
        provider: Arc<dyn IdentityProviderClient>,
        sessions: Arc<dyn SessionStore>,
        accounts: Arc<dyn AccountStore>,
        config: FlowConfig,
    ) -> Self {
        let logger = AuthLogger::global();
        Self {
            connections,
            provider,
            state_guard: StateTokenGuard::new(sessions),
            linker: IdentityLinker::new(accounts.clone(), logger.clone()),
            accounts,
            config,
            logger,
        }
    }

    /// Replace the diagnostic log sink
    #[must_use]
    pub fn with_logger(mut self, logger: AuthLogger) -> Self {
        self.linker = IdentityLinker::new(self.accounts.clone(), logger.clone());
        self.logger = logger;
        self
    }

    #[must_use]
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Start a login for `session` and return the provider redirect
    ///
    /// A fresh state token is stored for the session, replacing any token of
    /// an earlier unfinished attempt.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::NotConfigured`] if there is no active connection,
    /// or [`FlowError::Redirect`] if the redirect URL cannot be built.
    pub fn begin_login(&self, session: &SessionId) -> Result<Url, FlowError> {
        let Some(connection) = self.connections.active_connection() else {
            self.logger.log_not_configured();
            return Err(FlowError::NotConfigured);
        };

        let state = self.state_guard.issue(session);
        let redirect = self.provider.build_authorization_redirect(
            &connection.client_id,
            &self.config.scope,
            &self.config.callback_url,
            &state,
        )?;
        self.logger.log_state_issued();
        Ok(redirect)
    }

    /// Process a callback for `session`
    ///
    /// Steps run strictly in order and stop at the first failure: state check,
    /// connection lookup, code exchange, profile fetch, account linking. No
    /// provider call is made before the state token has been verified.
    pub async fn complete_login(
        &self,
        session: &SessionId,
        code: Option<&str>,
        state: Option<&str>,
    ) -> AuthOutcome {
        let Some(code) = code.filter(|code| !code.is_empty()) else {
            self.logger.log_not_applicable();
            return AuthOutcome::NotApplicable;
        };

        let state_valid = self.state_guard.validate(session, state);
        if self.config.single_use_state {
            self.state_guard.consume(session);
        }
        if !state_valid {
            self.logger.log_invalid_state(state);
            return AuthOutcome::Rejected(RejectReason::InvalidState);
        }
        self.logger.log_state_checked();

        let Some(connection) = self.connections.active_connection() else {
            self.logger.log_not_configured();
            return AuthOutcome::Rejected(RejectReason::NotConfigured);
        };

        let token = match self
            .provider
            .exchange_code_for_token(code, &connection, &self.config.callback_url)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                self.logger.log_provider_failure(&e);
                return AuthOutcome::Rejected(RejectReason::ProviderExchange);
            }
        };
        self.logger.log_token_received(&token);

        let identity = match self.provider.fetch_profile(&token.access_token).await {
            Ok(identity) => identity,
            Err(e) => {
                self.logger.log_provider_failure(&e);
                return AuthOutcome::Rejected(RejectReason::ProviderProfile);
            }
        };
        self.logger.log_profile_fetched(&identity);

        match self.linker.resolve(&identity, &token).await {
            Ok(linked) => {
                self.logger
                    .log_authenticated(&linked.account.username, linked.provisioned);
                AuthOutcome::Authenticated(Principal::new(linked.account.username))
            }
            Err(AccountStoreError::UsernameConflict(username)) => {
                AuthOutcome::Rejected(RejectReason::UsernameConflict(username))
            }
            Err(e) => {
                self.logger.log_account_store_failure(&e);
                AuthOutcome::Rejected(RejectReason::AccountStore)
            }
        }
    }
}

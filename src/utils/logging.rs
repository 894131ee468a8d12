// Diagnostic logging for the login flow
//
// The flow does not log through process-wide state. It owns an `AuthLogger`
// wrapping any `log::Log` sink; production uses a proxy to the global logger,
// tests inject a capturing sink.

use log::{Level, Log, Metadata, Record};
use std::fmt;
use std::sync::Arc;

use crate::accounts::AccountRef;
use crate::oauth::{ProviderError, ProviderToken, RemoteIdentity};

/// Target of every record emitted by [`AuthLogger`]
pub const AUTH_LOG_TARGET: &str = "idlink::auth";

/// Forwards records to whatever logger is installed globally
struct GlobalLog;

impl Log for GlobalLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            log::logger().log(record);
        }
    }

    fn flush(&self) {
        log::logger().flush();
    }
}

#[derive(Clone)]
pub struct AuthLogger {
    sink: Arc<dyn Log>,
}

impl Default for AuthLogger {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Debug for AuthLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthLogger")
    }
}

impl AuthLogger {
    /// Logger writing to the globally installed `log` backend
    #[must_use]
    pub fn global() -> Self {
        Self {
            sink: Arc::new(GlobalLog),
        }
    }

    /// Logger writing to `sink`
    #[must_use]
    pub fn new(sink: Arc<dyn Log>) -> Self {
        Self { sink }
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder()
            .level(level)
            .target(AUTH_LOG_TARGET)
            .build();
        if !self.sink.enabled(&metadata) {
            return;
        }
        self.sink.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }

    pub fn log_state_issued(&self) {
        self.debug(format_args!("Issued GitHub login state token, redirecting to provider"));
    }

    pub fn log_not_applicable(&self) {
        self.debug(format_args!(
            "No 'code' parameter found in the request, skip GitHub authentication"
        ));
    }

    /// Only the length of an attacker-controlled value is logged
    pub fn log_invalid_state(&self, supplied: Option<&str>) {
        match supplied {
            None => self.warn(format_args!(
                "Attempt to login using GitHub with empty 'state' parameter"
            )),
            Some(state) => self.warn(format_args!(
                "Attempt to login using GitHub with invalid 'state' parameter ({} chars)",
                state.len()
            )),
        }
    }

    pub fn log_state_checked(&self) {
        self.debug(format_args!("GitHub login state verified"));
    }

    pub fn log_not_configured(&self) {
        self.error(format_args!(
            "Attempt to login via GitHub OAuth while no GitHub connection is configured"
        ));
    }

    pub fn log_token_received(&self, token: &ProviderToken) {
        self.debug(format_args!("GitHub token received: {}", token.describe()));
    }

    pub fn log_profile_fetched(&self, identity: &RemoteIdentity) {
        self.debug(format_args!("GitHub user obtained: {}", identity.describe()));
    }

    pub fn log_provider_failure(&self, error: &ProviderError) {
        self.error(format_args!("GitHub login failed: {error}"));
    }

    pub fn log_account_found(&self, identity: &RemoteIdentity, account: &AccountRef) {
        self.debug(format_args!(
            "Corresponding user found for the GitHub user {}: '{}'",
            identity.describe(),
            account.username
        ));
    }

    pub fn log_account_created(&self, identity: &RemoteIdentity, account: &AccountRef) {
        self.info(format_args!(
            "New user '{}' created for the GitHub user {}",
            account.username,
            identity.describe()
        ));
    }

    pub fn log_username_conflict(&self, username: &str) {
        self.warn(format_args!(
            "GitHub login error: user with username '{username}' already exists"
        ));
    }

    pub fn log_account_store_failure(&self, error: &dyn std::error::Error) {
        self.error(format_args!("GitHub login failed in account store: {error}"));
    }

    pub fn log_authenticated(&self, username: &str, provisioned: bool) {
        if provisioned {
            self.info(format_args!(
                "GitHub login succeeded for '{username}' (first login, account provisioned)"
            ));
        } else {
            self.info(format_args!("GitHub login succeeded for '{username}'"));
        }
    }
}

//! Resolve a remote identity to a local account
//!
//! The provider user id is the only link key. The login name can change on
//! the provider side at any time, so it is used solely as the proposed
//! username when a new account is provisioned.

use std::sync::Arc;

use crate::accounts::store::{AccountRef, AccountStore, AccountStoreError, Provisioning};
use crate::oauth::{ProviderToken, RemoteIdentity};
use crate::utils::logging::AuthLogger;

/// Result of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAccount {
    pub account: AccountRef,
    /// `true` if the account was created by this resolution
    pub provisioned: bool,
}

#[derive(Clone)]
pub struct IdentityLinker {
    accounts: Arc<dyn AccountStore>,
    logger: AuthLogger,
}

impl IdentityLinker {
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountStore>, logger: AuthLogger) -> Self {
        Self { accounts, logger }
    }

    /// Find the account linked to `identity`, or provision one
    ///
    /// Either way the token association is recorded for the resolved account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountStoreError::UsernameConflict`] if provisioning would
    /// collide with an unrelated account; nothing is merged or renamed.
    /// Store failures are passed through as [`AccountStoreError::Backend`].
    pub async fn resolve(
        &self,
        identity: &RemoteIdentity,
        token: &ProviderToken,
    ) -> Result<LinkedAccount, AccountStoreError> {
        if let Some(account) = self
            .accounts
            .find_by_provider_id(&identity.provider_user_id)
            .await?
        {
            self.accounts
                .record_token_association(&account, &identity.login_name, token)
                .await?;
            self.logger.log_account_found(identity, &account);
            return Ok(LinkedAccount {
                account,
                provisioned: false,
            });
        }

        let provisioning = match self
            .accounts
            .create_account(&identity.login_name, &identity.provider_user_id)
            .await
        {
            Ok(provisioning) => provisioning,
            Err(AccountStoreError::UsernameConflict(username)) => {
                self.logger.log_username_conflict(&username);
                return Err(AccountStoreError::UsernameConflict(username));
            }
            Err(e) => return Err(e),
        };

        let (account, provisioned) = match provisioning {
            Provisioning::Created(account) => {
                self.logger.log_account_created(identity, &account);
                (account, true)
            }
            Provisioning::AlreadyLinked(account) => {
                self.logger.log_account_found(identity, &account);
                (account, false)
            }
        };
        self.accounts
            .record_token_association(&account, &identity.login_name, token)
            .await?;

        Ok(LinkedAccount {
            account,
            provisioned,
        })
    }
}

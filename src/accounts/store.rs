//! Local account storage
//!
//! [`AccountStore`] is the external collaborator that owns local accounts and
//! the reverse mapping from provider user id to account. Implementations must
//! guarantee that a provider user id is linked to at most one account, even
//! when two logins for the same new identity race.

use crate::oauth::ProviderToken;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Reference to a local account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRef {
    pub id: u64,
    pub username: String,
}

#[derive(Debug, Error)]
pub enum AccountStoreError {
    /// The username is held by an account not linked to this identity
    #[error("User with username '{0}' already exists")]
    UsernameConflict(String),

    #[error("Account store failure: {0}")]
    Backend(String),
}

/// Result of [`AccountStore::create_account`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioning {
    /// A new account was created and linked
    Created(AccountRef),
    /// The identity got linked by a concurrent login in the meantime
    AlreadyLinked(AccountRef),
}

impl Provisioning {
    #[must_use]
    pub fn into_account(self) -> AccountRef {
        match self {
            Self::Created(account) | Self::AlreadyLinked(account) => account,
        }
    }
}

/// Stored association between an account and its latest provider token
#[derive(Debug, Clone)]
pub struct TokenAssociation {
    pub login_name: String,
    pub token: ProviderToken,
    pub recorded_at: DateTime<Utc>,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up the account linked to `provider_user_id`
    ///
    /// # Errors
    ///
    /// Returns [`AccountStoreError::Backend`] if the store cannot be queried
    async fn find_by_provider_id(
        &self,
        provider_user_id: &str,
    ) -> Result<Option<AccountRef>, AccountStoreError>;

    /// Create an account named `login_name` linked to `provider_user_id`
    ///
    /// Must not create a second account for an already linked
    /// `provider_user_id`; the existing account is returned as
    /// [`Provisioning::AlreadyLinked`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`AccountStoreError::UsernameConflict`] if the name is taken by
    /// an unrelated account
    async fn create_account(
        &self,
        login_name: &str,
        provider_user_id: &str,
    ) -> Result<Provisioning, AccountStoreError>;

    /// Remember the provider token for `account`, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns [`AccountStoreError::Backend`] if the association cannot be stored
    async fn record_token_association(
        &self,
        account: &AccountRef,
        login_name: &str,
        token: &ProviderToken,
    ) -> Result<(), AccountStoreError>;
}

#[derive(Default)]
struct AccountTables {
    next_id: u64,
    // keyed by lowercased username
    accounts: HashMap<String, AccountRef>,
    links: HashMap<String, AccountRef>,
    tokens: HashMap<u64, TokenAssociation>,
}

impl AccountTables {
    fn insert(&mut self, username: &str) -> Result<AccountRef, AccountStoreError> {
        let key = username.to_lowercase();
        if self.accounts.contains_key(&key) {
            return Err(AccountStoreError::UsernameConflict(username.to_string()));
        }
        self.next_id += 1;
        let account = AccountRef {
            id: self.next_id,
            username: username.to_string(),
        };
        self.accounts.insert(key, account.clone());
        Ok(account)
    }
}

/// Process-local account store
///
/// All mutations happen under one mutex, which serialises provisioning: a
/// second `create_account` for an identity that got linked in the meantime
/// returns the already linked account instead of creating another one.
#[derive(Default)]
pub struct InMemoryAccountStore {
    tables: Mutex<AccountTables>,
}

impl InMemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, AccountTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an account that is not linked to any remote identity
    ///
    /// # Errors
    ///
    /// Returns [`AccountStoreError::UsernameConflict`] if the name is taken
    pub fn add_unlinked_account(&self, username: &str) -> Result<AccountRef, AccountStoreError> {
        self.tables().insert(username)
    }

    /// Add an account already linked to `provider_user_id`
    ///
    /// # Errors
    ///
    /// Returns [`AccountStoreError::UsernameConflict`] if the name is taken
    pub fn add_linked_account(
        &self,
        username: &str,
        provider_user_id: &str,
    ) -> Result<AccountRef, AccountStoreError> {
        let mut tables = self.tables();
        let account = tables.insert(username)?;
        tables
            .links
            .insert(provider_user_id.to_string(), account.clone());
        Ok(account)
    }

    #[must_use]
    pub fn account_count(&self) -> usize {
        self.tables().accounts.len()
    }

    /// Username linked to `provider_user_id`, if any
    #[must_use]
    pub fn linked_username(&self, provider_user_id: &str) -> Option<String> {
        self.tables()
            .links
            .get(provider_user_id)
            .map(|account| account.username.clone())
    }

    #[must_use]
    pub fn token_association(&self, account: &AccountRef) -> Option<TokenAssociation> {
        self.tables().tokens.get(&account.id).cloned()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_provider_id(
        &self,
        provider_user_id: &str,
    ) -> Result<Option<AccountRef>, AccountStoreError> {
        Ok(self.tables().links.get(provider_user_id).cloned())
    }

    async fn create_account(
        &self,
        login_name: &str,
        provider_user_id: &str,
    ) -> Result<Provisioning, AccountStoreError> {
        let mut tables = self.tables();
        if let Some(existing) = tables.links.get(provider_user_id) {
            log::debug!(
                "Provider id {provider_user_id} was linked concurrently to '{}'",
                existing.username
            );
            return Ok(Provisioning::AlreadyLinked(existing.clone()));
        }
        let account = tables.insert(login_name)?;
        tables
            .links
            .insert(provider_user_id.to_string(), account.clone());
        Ok(Provisioning::Created(account))
    }

    async fn record_token_association(
        &self,
        account: &AccountRef,
        login_name: &str,
        token: &ProviderToken,
    ) -> Result<(), AccountStoreError> {
        let mut tables = self.tables();
        if !tables
            .accounts
            .contains_key(&account.username.to_lowercase())
        {
            return Err(AccountStoreError::Backend(format!(
                "unknown account '{}'",
                account.username
            )));
        }
        tables.tokens.insert(
            account.id,
            TokenAssociation {
                login_name: login_name.to_string(),
                token: token.clone(),
                recorded_at: Utc::now(),
            },
        );
        Ok(())
    }
}

//! In-memory credential store.
//!
//! Backs unit and integration tests. All operations take the single write
//! lock so the atomicity contract matches the `PostgreSQL` backend:
//! uniqueness is checked under the lock, and the conditional transitions
//! observe a consistent pre-state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use teslaverse_core::{Email, UserId, VerificationCode};

use super::{CredentialStore, NewAccount, ProfileChanges, RepositoryError};
use crate::models::{Account, PendingCode};

#[derive(Default)]
struct Inner {
    next_id: i32,
    accounts: HashMap<i32, Account>,
}

/// Credential store held in process memory.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-built account, bypassing registration.
    ///
    /// Test helper for seeding verified or admin accounts. Returns the
    /// assigned ID.
    pub async fn insert(&self, mut account: Account) -> UserId {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = UserId::new(inner.next_id);
        account.id = id;
        inner.accounts.insert(id.as_i32(), account);
        id
    }

    /// Flip the admin flag on an existing account. Test helper.
    pub async fn set_admin(&self, id: UserId, is_admin: bool) {
        let mut inner = self.inner.write().await;
        if let Some(account) = inner.accounts.get_mut(&id.as_i32()) {
            account.is_admin = is_admin;
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, new: NewAccount<'_>) -> Result<Account, RepositoryError> {
        let mut inner = self.inner.write().await;

        // Uniqueness enforced under the write lock, mirroring the database
        // constraint.
        if inner.accounts.values().any(|a| a.email == *new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        inner.next_id += 1;
        let account = Account {
            id: UserId::new(inner.next_id),
            email: new.email.clone(),
            password_hash: new.password_hash.to_owned(),
            display_name: new.display_name.to_owned(),
            balance: rust_decimal::Decimal::ZERO,
            profit_percent: rust_decimal::Decimal::ZERO,
            is_admin: false,
            verified: false,
            pending: Some(PendingCode {
                code: new.code.clone(),
                expires_at: new.code_expiry,
            }),
            created_at: Utc::now(),
        };
        inner.accounts.insert(account.id.as_i32(), account.clone());

        Ok(account)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().find(|a| a.email == *email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.get(&id.as_i32()).cloned())
    }

    async fn mark_verified(
        &self,
        id: UserId,
        code: &VerificationCode,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(account) = inner.accounts.get_mut(&id.as_i32()) else {
            return Ok(false);
        };
        if account.verified {
            return Ok(false);
        }
        // The transition is bound to the exact pending code, mirroring the
        // conditional UPDATE in the database backend.
        if account.pending.as_ref().is_none_or(|p| p.code != *code) {
            return Ok(false);
        }
        account.verified = true;
        account.pending = None;
        Ok(true)
    }

    async fn replace_code(
        &self,
        id: UserId,
        code: &VerificationCode,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(account) = inner.accounts.get_mut(&id.as_i32()) else {
            return Ok(false);
        };
        if account.verified {
            return Ok(false);
        }
        account.pending = Some(PendingCode {
            code: code.clone(),
            expires_at,
        });
        Ok(true)
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<Account, RepositoryError> {
        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;

        if let Some(balance) = changes.balance {
            account.balance = balance;
        }
        if let Some(profit_percent) = changes.profit_percent {
            account.profit_percent = profit_percent;
        }
        if let Some(display_name) = changes.display_name {
            account.display_name = display_name;
        }

        Ok(account.clone())
    }

    async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut accounts: Vec<Account> = inner.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.id.as_i32());
        Ok(accounts)
    }
}

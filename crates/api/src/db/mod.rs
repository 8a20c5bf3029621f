//! Credential storage for the API.
//!
//! # Database: `teslaverse`
//!
//! A single `users` table is the source of truth for accounts and their
//! verification state:
//!
//! - `users` - accounts, password hashes, verification state, pending codes
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and are applied on startup.
//!
//! # Storage abstraction
//!
//! All access goes through the [`CredentialStore`] trait so the verification
//! state machine depends on a contract, not on a concrete backend:
//!
//! - [`PgCredentialStore`] - production backend over `PostgreSQL`
//! - [`MemoryCredentialStore`] - in-process backend for tests

pub mod memory;
pub mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use teslaverse_core::{Email, UserId, VerificationCode};

use crate::models::Account;

/// Errors from credential storage operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Uniqueness conflict (duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Row not found where one was required.
    #[error("not found")]
    NotFound,

    /// Stored data violates an invariant.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Fields required to create a new account.
///
/// Accounts are always created unverified with a pending code, so the code
/// and its expiry are part of creation rather than a separate update.
#[derive(Debug)]
pub struct NewAccount<'a> {
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub code: &'a VerificationCode,
    pub code_expiry: DateTime<Utc>,
}

/// Partial administrative profile update.
///
/// `None` fields are left unchanged.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub balance: Option<Decimal>,
    pub profit_percent: Option<Decimal>,
    pub display_name: Option<String>,
}

/// Source of truth for accounts and their verification state.
///
/// Every mutation is atomic and immediately visible to subsequent reads.
/// Uniqueness of emails is enforced by the store itself, not by callers
/// checking first.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create a new unverified account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    async fn create(&self, new: NewAccount<'_>) -> Result<Account, RepositoryError>;

    /// Look up an account by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError>;

    /// Look up an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, RepositoryError>;

    /// Atomically set `verified = true` and clear the pending code + expiry.
    ///
    /// Conditional on the account still being unverified AND `code` still
    /// being the pending code: returns `true` if this call performed the
    /// transition, `false` if a concurrent verify already won, a resend
    /// replaced the code after the caller read it, or the row is gone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    async fn mark_verified(
        &self,
        id: UserId,
        code: &VerificationCode,
    ) -> Result<bool, RepositoryError>;

    /// Atomically overwrite the pending code and expiry.
    ///
    /// The previous code becomes invalid the instant this returns. Same
    /// conditional contract as [`CredentialStore::mark_verified`]: returns
    /// `false` if the account is already verified or missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    async fn replace_code(
        &self,
        id: UserId,
        code: &VerificationCode,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Apply an administrative profile update, returning the updated account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<Account, RepositoryError>;

    /// List all accounts, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    async fn list(&self) -> Result<Vec<Account>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations.
///
/// Runs on startup so the schema is in place before the server binds.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

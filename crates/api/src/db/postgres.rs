//! `PostgreSQL` credential store.
//!
//! Runtime-checked queries (`sqlx::query_as`) rather than the compile-time
//! macros, so the workspace builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use teslaverse_core::{Email, UserId, VerificationCode};

use super::{CredentialStore, NewAccount, ProfileChanges, RepositoryError};
use crate::models::{Account, PendingCode};

/// Columns selected for every account read.
const ACCOUNT_COLUMNS: &str = "id, email, password_hash, display_name, balance, \
     profit_percent, is_admin, verified, verification_code, code_expiry, created_at";

/// Raw `users` row as stored.
#[derive(Debug, FromRow)]
struct AccountRow {
    id: UserId,
    email: Email,
    password_hash: String,
    display_name: String,
    balance: Decimal,
    profit_percent: Decimal,
    is_admin: bool,
    verified: bool,
    verification_code: Option<VerificationCode>,
    code_expiry: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let pending = match (row.verification_code, row.code_expiry) {
            (Some(code), Some(expires_at)) => Some(PendingCode { code, expires_at }),
            (None, None) => None,
            _ => {
                return Err(RepositoryError::DataCorruption(
                    "verification_code and code_expiry out of sync".to_owned(),
                ));
            }
        };

        Ok(Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            display_name: row.display_name,
            balance: row.balance,
            profit_percent: row.profit_percent,
            is_admin: row.is_admin,
            verified: row.verified,
            pending,
            created_at: row.created_at,
        })
    }
}

/// Credential store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, new: NewAccount<'_>) -> Result<Account, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, display_name, verification_code, code_expiry) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let row: AccountRow = sqlx::query_as(&sql)
            .bind(new.email)
            .bind(new.password_hash)
            .bind(new.display_name)
            .bind(new.code)
            .bind(new.code_expiry)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("email already exists".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        row.try_into()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1");

        let row: Option<AccountRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, RepositoryError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1");

        let row: Option<AccountRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn mark_verified(
        &self,
        id: UserId,
        code: &VerificationCode,
    ) -> Result<bool, RepositoryError> {
        // Single conditional statement: verified flag and code fields change
        // together, and the transition only fires for the exact code the
        // caller matched. A concurrent resend that replaced the code makes
        // this a no-op.
        let result = sqlx::query(
            "UPDATE users \
             SET verified = TRUE, verification_code = NULL, code_expiry = NULL \
             WHERE id = $1 AND verified = FALSE AND verification_code = $2",
        )
        .bind(id)
        .bind(code)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_code(
        &self,
        id: UserId,
        code: &VerificationCode,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users \
             SET verification_code = $2, code_expiry = $3 \
             WHERE id = $1 AND verified = FALSE",
        )
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<Account, RepositoryError> {
        let sql = format!(
            "UPDATE users \
             SET balance = COALESCE($2, balance), \
                 profit_percent = COALESCE($3, profit_percent), \
                 display_name = COALESCE($4, display_name) \
             WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let row: Option<AccountRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(changes.balance)
            .bind(changes.profit_percent)
            .bind(changes.display_name)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users ORDER BY id ASC");

        let rows: Vec<AccountRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

//! Account domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use teslaverse_core::{Email, UserId, VerificationCode};

/// A registered account (domain type).
///
/// One per distinct lowercased email address. Created unverified with a
/// pending code; verification is a one-way transition that clears the code.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique account ID, assigned at creation, never reused.
    pub id: UserId,
    /// Account email address (unique, lowercased).
    pub email: Email,
    /// Argon2id password hash. Never serialized.
    pub password_hash: String,
    /// Free-text display name.
    pub display_name: String,
    /// Account balance, mutated only through the admin capability.
    pub balance: Decimal,
    /// Displayed profit percentage, mutated only through the admin capability.
    pub profit_percent: Decimal,
    /// Whether the account has administrative rights.
    pub is_admin: bool,
    /// Whether the email has been verified. Irreversible once true.
    pub verified: bool,
    /// Pending verification code, present only while unverified.
    pub pending: Option<PendingCode>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A pending verification code with its expiry.
///
/// Code and expiry travel together so the "both present or both absent"
/// invariant holds by construction.
#[derive(Debug, Clone)]
pub struct PendingCode {
    /// The 6-digit code last sent to the account's email.
    pub code: VerificationCode,
    /// Instant after which the code is no longer acceptable.
    pub expires_at: DateTime<Utc>,
}

impl Account {
    /// Whether the pending code has expired as of `now`.
    ///
    /// Returns false when there is no pending code.
    #[must_use]
    pub fn code_expired(&self, now: DateTime<Utc>) -> bool {
        self.pending.as_ref().is_some_and(|p| now >= p.expires_at)
    }
}

/// The account payload exposed over the API.
///
/// Excludes the password hash and the pending code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub email: Email,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub balance: Decimal,
    pub profit_percent: Decimal,
    pub is_admin: bool,
}

impl From<&Account> for UserResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            created_at: account.created_at,
            balance: account.balance,
            profit_percent: account.profit_percent,
            is_admin: account.is_admin,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        Account {
            id: UserId::new(1),
            email: Email::parse("ann@x.com").unwrap(),
            password_hash: "$argon2id$stub".to_string(),
            display_name: "Ann".to_string(),
            balance: Decimal::ZERO,
            profit_percent: Decimal::ZERO,
            is_admin: false,
            verified: false,
            pending: Some(PendingCode {
                code: VerificationCode::parse("123456").unwrap(),
                expires_at: Utc::now() + teslaverse_core::CODE_VALIDITY,
            }),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_response_excludes_secrets() {
        let account = sample_account();
        let response = UserResponse::from(&account);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["email"], "ann@x.com");
        assert_eq!(json["displayName"], "Ann");
        assert_eq!(json["isAdmin"], false);
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("pendingCode").is_none());
        assert!(json.get("verified").is_none());
    }

    #[test]
    fn test_code_expired() {
        let mut account = sample_account();
        let now = Utc::now();
        assert!(!account.code_expired(now));

        account.pending = Some(PendingCode {
            code: VerificationCode::parse("123456").unwrap(),
            expires_at: now - chrono::Duration::seconds(1),
        });
        assert!(account.code_expired(now));

        account.pending = None;
        assert!(!account.code_expired(now));
    }
}

//! Account registration, email verification, and login.
//!
//! Accounts start unverified with a pending 6-digit code. Verification
//! consumes the code and issues the first session token; login only
//! succeeds for verified accounts. The verified transition happens in a
//! single conditional store operation, so concurrent verify attempts
//! produce exactly one session.

mod error;

pub use error::AuthError;

use std::sync::Arc;
use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;

use teslaverse_core::{Email, VerificationCode};

use crate::db::{CredentialStore, NewAccount, RepositoryError};
use crate::models::Account;
use crate::services::email::{EmailError, Notifier};
use crate::services::session::SessionIssuer;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Upper bound on a single delivery attempt. A slow SMTP relay must not
/// hold the request open indefinitely.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a successful registration.
///
/// Deliberately carries no session token: the account is unverified until
/// the emailed code comes back.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Canonical (lowercased) email the code was sent to.
    pub email: Email,
}

/// An authenticated session: the signed token plus the account it names.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account: Account,
}

/// Account lifecycle service.
///
/// Owns the registration, verification, resend, and login transitions over
/// a [`CredentialStore`], delivering codes through a [`Notifier`] and
/// minting tokens with a [`SessionIssuer`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    sessions: SessionIssuer,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
        sessions: SessionIssuer,
    ) -> Self {
        Self {
            store,
            notifier,
            sessions,
        }
    }

    /// Register a new account and send its verification code.
    ///
    /// The account is created unverified. Delivery failure does not fail
    /// registration: the account exists and the client can request a
    /// resend.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword`, or
    /// `AuthError::EmptyDisplayName` on validation failure, and
    /// `AuthError::EmailTaken` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Registration, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AuthError::EmptyDisplayName);
        }

        let password_hash = hash_password(password)?;

        let code = VerificationCode::generate();
        let code_expiry = VerificationCode::expiry_from(Utc::now());

        let account = self
            .store
            .create(NewAccount {
                email: &email,
                password_hash: &password_hash,
                display_name,
                code: &code,
                code_expiry,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        if let Err(e) = self.notify(&account, &code).await {
            // The account is durable; the client can hit resend-code.
            tracing::warn!(
                email = %account.email,
                error = %e,
                "Verification email failed after registration"
            );
        }

        Ok(Registration {
            email: account.email,
        })
    }

    /// Verify an email with a pending code and issue the first session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if no account exists,
    /// `AuthError::AlreadyVerified` if the account is verified (including
    /// losing a concurrent verify race), `AuthError::CodeExpired` if the
    /// code's validity window has passed, and `AuthError::CodeMismatch`
    /// for a wrong or malformed code.
    pub async fn verify_email(&self, email: &str, code: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email)?;

        let mut account = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if account.verified {
            return Err(AuthError::AlreadyVerified);
        }

        // Expiry wins over mismatch: an expired code reports expired even
        // when the digits are also wrong.
        if account.code_expired(Utc::now()) {
            return Err(AuthError::CodeExpired);
        }

        let Some(pending) = &account.pending else {
            // Unverified with no pending code: only reachable if the code
            // was cleared out of band. Treat like an expired code.
            return Err(AuthError::CodeExpired);
        };

        let submitted = VerificationCode::parse(code).map_err(|_| AuthError::CodeMismatch)?;
        if submitted != pending.code {
            return Err(AuthError::CodeMismatch);
        }

        // Conditional transition, bound to the code this request matched:
        // false means a concurrent verify already took the session token, or
        // a concurrent resend replaced the code after our read.
        if !self.store.mark_verified(account.id, &submitted).await? {
            let fresh = self
                .store
                .find_by_id(account.id)
                .await?
                .ok_or(AuthError::NotFound)?;
            if fresh.verified {
                return Err(AuthError::AlreadyVerified);
            }
            return Err(AuthError::CodeMismatch);
        }

        account.verified = true;
        account.pending = None;

        let token = self.sessions.issue(account.id)?;
        Ok(Session { token, account })
    }

    /// Replace the pending code with a fresh one and resend it.
    ///
    /// The previous code stops working as soon as the replacement is
    /// stored. Unlike registration, delivery failure here is surfaced:
    /// resend exists only to deliver a code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if no account exists,
    /// `AuthError::AlreadyVerified` for verified accounts, and
    /// `AuthError::Delivery` if the email cannot be sent.
    pub async fn resend_code(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;

        let account = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if account.verified {
            return Err(AuthError::AlreadyVerified);
        }

        let code = VerificationCode::generate();
        let expires_at = VerificationCode::expiry_from(Utc::now());

        if !self.store.replace_code(account.id, &code, expires_at).await? {
            // Verified between the read and the write.
            return Err(AuthError::AlreadyVerified);
        }

        self.notify(&account, &code).await?;
        Ok(())
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` whether the account is
    /// missing or the password is wrong, so responses don't reveal which
    /// emails are registered. Returns `AuthError::VerificationRequired`
    /// when the credentials are correct but the email is unverified.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email)?;

        let Some(account) = self.store.find_by_email(&email).await? else {
            // Burn the same argon2 cost as a real check so response timing
            // does not reveal whether the email is registered.
            let _ = hash_password(password);
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &account.password_hash)?;

        if !account.verified {
            return Err(AuthError::VerificationRequired {
                email: account.email,
            });
        }

        let token = self.sessions.issue(account.id)?;
        Ok(Session { token, account })
    }

    /// Resolve a bearer token to its account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for bad tokens and for tokens
    /// whose account no longer exists.
    pub async fn current_user(&self, token: &str) -> Result<Account, AuthError> {
        let user_id = self.sessions.validate(token)?;

        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// Deliver a code, bounded by [`NOTIFY_TIMEOUT`].
    async fn notify(&self, account: &Account, code: &VerificationCode) -> Result<(), EmailError> {
        tokio::time::timeout(
            NOTIFY_TIMEOUT,
            self.notifier
                .send_verification_code(&account.email, code, &account.display_name),
        )
        .await
        .map_err(|_| EmailError::Timeout)?
    }
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

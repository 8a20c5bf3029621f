//! Authentication error types.

use thiserror::Error;

use teslaverse_core::Email;

use crate::db::RepositoryError;
use crate::services::email::EmailError;
use crate::services::session::SessionError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] teslaverse_core::EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Display name is empty.
    #[error("display name must not be empty")]
    EmptyDisplayName,

    /// Email already registered.
    #[error("email already registered")]
    EmailTaken,

    /// No account for the given email.
    #[error("account not found")]
    NotFound,

    /// Account is already verified.
    #[error("account already verified")]
    AlreadyVerified,

    /// Submitted code does not match the pending code.
    #[error("verification code mismatch")]
    CodeMismatch,

    /// Pending code has expired.
    #[error("verification code expired")]
    CodeExpired,

    /// Invalid credentials (wrong password or account not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Credentials are correct but the email has not been verified.
    #[error("email not verified")]
    VerificationRequired {
        /// Canonical email, so the client can drive the verify flow.
        email: Email,
    },

    /// No bearer token on the request.
    #[error("no session token provided")]
    MissingToken,

    /// Bad signature, malformed, or expired session token.
    #[error("invalid session token")]
    InvalidToken,

    /// Session token could not be signed.
    #[error("failed to sign session token")]
    TokenSigning,

    /// Authenticated account lacks admin rights.
    #[error("admin access required")]
    Forbidden,

    /// Verification email could not be delivered.
    #[error("email delivery failed: {0}")]
    Delivery(#[from] EmailError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidToken => Self::InvalidToken,
            SessionError::Signing => Self::TokenSigning,
        }
    }
}

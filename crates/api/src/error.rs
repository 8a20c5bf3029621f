//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`. Responses are JSON `{"error": "..."}` bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(
                err,
                AuthError::Delivery(_)
                    | AuthError::Repository(_)
                    | AuthError::PasswordHash
                    | AuthError::TokenSigning
            ),
            Self::BadRequest(_) => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::EmptyDisplayName
                | AuthError::AlreadyVerified
                | AuthError::CodeMismatch
                | AuthError::CodeExpired => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::VerificationRequired { .. } | AuthError::Forbidden => {
                    StatusCode::FORBIDDEN
                }
                AuthError::NotFound => StatusCode::NOT_FOUND,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::Delivery(_)
                | AuthError::Repository(_)
                | AuthError::PasswordHash
                | AuthError::TokenSigning => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Client-facing JSON body. Internal detail never leaks here.
    fn body(&self) -> serde_json::Value {
        let message = match self {
            Self::Database(_) | Self::Internal(_) => "Server error".to_owned(),
            Self::BadRequest(msg) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::EmptyDisplayName => "Display name is required".to_owned(),
                AuthError::EmailTaken => "Email already registered".to_owned(),
                AuthError::NotFound => "Account not found".to_owned(),
                AuthError::AlreadyVerified => "Email already verified".to_owned(),
                AuthError::CodeMismatch => "Invalid verification code".to_owned(),
                AuthError::CodeExpired => "Verification code expired".to_owned(),
                AuthError::InvalidCredentials => "Invalid credentials".to_owned(),
                AuthError::VerificationRequired { email } => {
                    return json!({
                        "error": "Email not verified",
                        "requiresVerification": true,
                        "email": email.as_str(),
                    });
                }
                AuthError::MissingToken => "No token provided".to_owned(),
                AuthError::InvalidToken => "Invalid token".to_owned(),
                AuthError::Forbidden => "Admin access required".to_owned(),
                AuthError::Delivery(_) => "Failed to send verification email".to_owned(),
                AuthError::Repository(_)
                | AuthError::PasswordHash
                | AuthError::TokenSigning => "Server error".to_owned(),
            },
        };

        json!({ "error": message })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

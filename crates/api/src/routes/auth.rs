//! Authentication route handlers.
//!
//! Registration, email verification, code resend, login, and the
//! current-user endpoint. All bodies are JSON with camelCase keys.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::UserResponse;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Email verification request body.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// Resend-code request body.
#[derive(Debug, Deserialize)]
pub struct ResendCodeRequest {
    pub email: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// Response for registration and resend: no token until verification.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: &'static str,
    pub requires_verification: bool,
    pub email: String,
}

/// Response carrying a session token and the account it names.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a new account and email its verification code.
///
/// Returns 201 with no session token: the account cannot log in until the
/// code comes back through `verify-email`.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let registration = state
        .auth()
        .register(&body.email, &body.password, &body.display_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Verification code sent",
            requires_verification: true,
            email: registration.email.as_str().to_owned(),
        }),
    ))
}

/// Submit a verification code and receive the first session token.
pub async fn verify_email(
    State(state): State<AppState>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<Json<SessionResponse>> {
    let session = state.auth().verify_email(&body.email, &body.code).await?;

    Ok(Json(SessionResponse {
        token: session.token,
        user: UserResponse::from(&session.account),
    }))
}

/// Replace the pending code and resend it.
pub async fn resend_code(
    State(state): State<AppState>,
    Json(body): Json<ResendCodeRequest>,
) -> Result<Json<MessageResponse>> {
    state.auth().resend_code(&body.email).await?;

    Ok(Json(MessageResponse {
        message: "Verification code sent",
        requires_verification: true,
        email: body.email.trim().to_lowercase(),
    }))
}

/// Login with email and password.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let session = state.auth().login(&body.email, &body.password).await?;

    Ok(Json(SessionResponse {
        token: session.token,
        user: UserResponse::from(&session.account),
    }))
}

/// Return the authenticated account.
pub async fn me(RequireUser(account): RequireUser) -> Json<UserResponse> {
    Json(UserResponse::from(&account))
}

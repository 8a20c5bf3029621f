//! Authentication extractors.
//!
//! Bearer-token extractors for route handlers. The token is validated,
//! then the account is loaded fresh from the store so revoked or deleted
//! accounts stop authenticating immediately.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::AppError;
use crate::models::Account;
use crate::services::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid session token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(account): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", account.display_name)
/// }
/// ```
pub struct RequireUser(pub Account);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let account = state.auth().current_user(token).await?;
        Ok(Self(account))
    }
}

/// Extractor that requires a valid session token for an admin account.
pub struct RequireAdmin(pub Account);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(account) = RequireUser::from_request_parts(parts, state).await?;

        if !account.is_admin {
            return Err(AuthError::Forbidden.into());
        }

        Ok(Self(account))
    }
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::MissingToken.into())
}

//! Admin route handlers.
//!
//! Account listing and profile adjustments (balance, profit percent,
//! display name). Every handler requires an admin session token.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use teslaverse_core::UserId;

use crate::db::{ProfileChanges, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::UserResponse;
use crate::services::AuthError;
use crate::state::AppState;

/// Partial profile update. Absent fields are left untouched.
///
/// Decimal fields are JSON strings ("150000.00") to avoid float rounding.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub balance: Option<Decimal>,
    pub profit_percent: Option<Decimal>,
    pub display_name: Option<String>,
}

/// List every account, oldest first.
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>> {
    let accounts = state.store().list().await.map_err(AppError::Database)?;

    Ok(Json(accounts.iter().map(UserResponse::from).collect()))
}

/// Update an account's balance, profit percent, or display name.
pub async fn update_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    if let Some(name) = &body.display_name
        && name.trim().is_empty()
    {
        return Err(AppError::BadRequest("Display name is required".to_owned()));
    }

    let changes = ProfileChanges {
        balance: body.balance,
        profit_percent: body.profit_percent,
        display_name: body.display_name.map(|n| n.trim().to_owned()),
    };

    let account = state
        .store()
        .update_profile(UserId::new(id), changes)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::Auth(AuthError::NotFound),
            other => AppError::Database(other),
        })?;

    Ok(Json(UserResponse::from(&account)))
}

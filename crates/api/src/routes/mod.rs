//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//!
//! # Auth
//! POST /api/auth/register           - Create account, send verification code
//! POST /api/auth/verify-email       - Submit code, receive first session token
//! POST /api/auth/resend-code        - Replace pending code and resend it
//! POST /api/auth/login              - Login (verified accounts only)
//! GET  /api/auth/me                 - Current account (requires token)
//!
//! # Admin (requires admin token)
//! GET  /api/admin/users             - List all accounts
//! PUT  /api/admin/users/{id}        - Update balance / profit percent / name
//! ```

pub mod admin;
pub mod auth;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify-email", post(auth::verify_email))
        .route("/resend-code", post(auth::resend_code))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes())
        .nest("/api/admin", admin_routes())
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}

//! Admin capability: account listing and profile adjustments.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use teslaverse_api::db::CredentialStore;
use teslaverse_core::Email;
use teslaverse_integration_tests::TestContext;

/// Register + verify an account, then flip its admin flag in the store.
async fn admin_token(ctx: &TestContext) -> String {
    let token = ctx
        .register_verified("root@tslaverse.online", "hunter22", "Root")
        .await;
    let email = Email::parse("root@tslaverse.online").unwrap();
    let account = ctx.store.find_by_email(&email).await.unwrap().unwrap();
    ctx.store.set_admin(account.id, true).await;
    token
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/api/admin/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token provided");
}

#[tokio::test]
async fn test_non_admin_is_forbidden() {
    let ctx = TestContext::new();
    let token = ctx.register_verified("ann@x.com", "hunter22", "Ann").await;

    let (status, body) = ctx.get("/api/admin/users", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");

    let (status, _) = ctx
        .put("/api/admin/users/1", &token, json!({ "balance": "100" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_lists_all_accounts() {
    let ctx = TestContext::new();
    let token = admin_token(&ctx).await;
    ctx.register("ann@x.com", "hunter22", "Ann").await;

    let (status, body) = ctx.get("/api/admin/users", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    // Ordered by ID, and unverified accounts appear too
    assert_eq!(users[0]["email"], "root@tslaverse.online");
    assert_eq!(users[1]["email"], "ann@x.com");
    assert!(users[1].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_admin_updates_balance_and_profit() {
    let ctx = TestContext::new();
    let token = admin_token(&ctx).await;
    ctx.register_verified("ann@x.com", "hunter22", "Ann").await;

    let email = Email::parse("ann@x.com").unwrap();
    let account = ctx.store.find_by_email(&email).await.unwrap().unwrap();

    let (status, body) = ctx
        .put(
            &format!("/api/admin/users/{}", account.id),
            &token,
            json!({ "balance": "150000.00", "profitPercent": "12.5" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "150000.00");
    assert_eq!(body["profitPercent"], "12.5");
    // Untouched field survives
    assert_eq!(body["displayName"], "Ann");
}

#[tokio::test]
async fn test_admin_update_rejects_blank_display_name() {
    let ctx = TestContext::new();
    let token = admin_token(&ctx).await;
    ctx.register_verified("ann@x.com", "hunter22", "Ann").await;

    let email = Email::parse("ann@x.com").unwrap();
    let account = ctx.store.find_by_email(&email).await.unwrap().unwrap();

    let (status, _) = ctx
        .put(
            &format!("/api/admin/users/{}", account.id),
            &token,
            json!({ "displayName": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_update_missing_account() {
    let ctx = TestContext::new();
    let token = admin_token(&ctx).await;

    let (status, _) = ctx
        .put("/api/admin/users/999", &token, json!({ "balance": "1" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//! Verification code edge cases: wrong codes, expiry, resend, idempotency.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;
use teslaverse_api::db::CredentialStore;
use teslaverse_core::Email;
use teslaverse_integration_tests::TestContext;

#[tokio::test]
async fn test_wrong_code_rejected_and_state_preserved() {
    let ctx = TestContext::new();
    let code = ctx.register("ann@x.com", "hunter22", "Ann").await;

    let wrong = if code.as_str() == "000000" {
        "000001"
    } else {
        "000000"
    };
    let (status, body) = ctx
        .post(
            "/api/auth/verify-email",
            json!({ "email": "ann@x.com", "code": wrong }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid verification code");

    // The real code still works after a failed attempt
    let (status, _) = ctx
        .post(
            "/api/auth/verify-email",
            json!({ "email": "ann@x.com", "code": code.as_str() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_code_rejected() {
    let ctx = TestContext::new();
    ctx.register("ann@x.com", "hunter22", "Ann").await;

    for bad in ["12345", "1234567", "12a456", ""] {
        let (status, _) = ctx
            .post(
                "/api/auth/verify-email",
                json!({ "email": "ann@x.com", "code": bad }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "code {bad:?}");
    }
}

#[tokio::test]
async fn test_expired_code_rejected() {
    let ctx = TestContext::new();
    let code = ctx.register("ann@x.com", "hunter22", "Ann").await;

    // Push the pending expiry into the past
    let email = Email::parse("ann@x.com").unwrap();
    let account = ctx.store.find_by_email(&email).await.unwrap().unwrap();
    ctx.store
        .replace_code(account.id, &code, Utc::now() - chrono::Duration::seconds(1))
        .await
        .unwrap();

    let (status, body) = ctx
        .post(
            "/api/auth/verify-email",
            json!({ "email": "ann@x.com", "code": code.as_str() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Verification code expired");
}

#[tokio::test]
async fn test_verify_unknown_email_not_found() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .post(
            "/api/auth/verify-email",
            json!({ "email": "nobody@x.com", "code": "123456" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verify_twice_reports_already_verified() {
    let ctx = TestContext::new();
    let code = ctx.register("ann@x.com", "hunter22", "Ann").await;

    let (status, _) = ctx
        .post(
            "/api/auth/verify-email",
            json!({ "email": "ann@x.com", "code": code.as_str() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Replay of the same request: no second token
    let (status, body) = ctx
        .post(
            "/api/auth/verify-email",
            json!({ "email": "ann@x.com", "code": code.as_str() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already verified");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_resend_replaces_previous_code() {
    let ctx = TestContext::new();
    let old = ctx.register("ann@x.com", "hunter22", "Ann").await;

    let (status, _) = ctx
        .post("/api/auth/resend-code", json!({ "email": "ann@x.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.notifier.sent_count(), 2);

    let fresh = ctx.notifier.last_code_for("ann@x.com").unwrap();

    // The old code is dead unless the RNG repeated itself
    if old != fresh {
        let (status, _) = ctx
            .post(
                "/api/auth/verify-email",
                json!({ "email": "ann@x.com", "code": old.as_str() }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = ctx
        .post(
            "/api/auth/verify-email",
            json!({ "email": "ann@x.com", "code": fresh.as_str() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_resend_for_verified_account_rejected() {
    let ctx = TestContext::new();
    ctx.register_verified("ann@x.com", "hunter22", "Ann").await;

    let (status, body) = ctx
        .post("/api/auth/resend-code", json!({ "email": "ann@x.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already verified");
}

#[tokio::test]
async fn test_resend_unknown_email_not_found() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .post("/api/auth/resend-code", json!({ "email": "nobody@x.com" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//! Integration test harness for the TeslaVerse API.
//!
//! Runs the real router over the in-memory credential store and a
//! recording notifier, so tests exercise the full HTTP surface without a
//! database or an SMTP relay. Codes "sent" during a test are captured and
//! can be read back to drive the verification flow.

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test support code: panicking on harness misuse is the right failure mode
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use teslaverse_api::config::ApiConfig;
use teslaverse_api::db::MemoryCredentialStore;
use teslaverse_api::routes;
use teslaverse_api::services::{EmailError, Notifier};
use teslaverse_api::state::AppState;
use teslaverse_core::{Email, VerificationCode};

/// Notifier that captures every delivery instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Email, VerificationCode)>>,
}

impl RecordingNotifier {
    /// The most recent code "sent" to `email`.
    #[must_use]
    pub fn last_code_for(&self, email: &str) -> Option<VerificationCode> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to.as_str() == email)
            .map(|(_, code)| code.clone())
    }

    /// Total number of deliveries recorded.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_verification_code(
        &self,
        to: &Email,
        code: &VerificationCode,
        _display_name: &str,
    ) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push((to.clone(), code.clone()));
        Ok(())
    }
}

/// A fully wired API router plus handles into its backing store and
/// notifier.
pub struct TestContext {
    router: Router,
    pub store: Arc<MemoryCredentialStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Build a context over fresh in-memory backends.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryCredentialStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(test_config(), store.clone(), notifier.clone());
        let router = routes::routes().with_state(state);

        Self {
            router,
            store,
            notifier,
        }
    }

    /// Issue a request and return (status, parsed JSON body).
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// POST a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", path, None, Some(body)).await
    }

    /// GET with an optional bearer token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", path, token, None).await
    }

    /// PUT a JSON body with a bearer token.
    pub async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", path, Some(token), Some(body)).await
    }

    /// Register an account and return the code that was "emailed".
    pub async fn register(&self, email: &str, password: &str, name: &str) -> VerificationCode {
        let (status, _) = self
            .post(
                "/api/auth/register",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "displayName": name,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        self.notifier
            .last_code_for(&email.to_lowercase())
            .expect("registration should have sent a code")
    }

    /// Register, verify, and return the session token.
    pub async fn register_verified(&self, email: &str, password: &str, name: &str) -> String {
        let code = self.register(email, password, name).await;
        let (status, body) = self
            .post(
                "/api/auth/verify-email",
                serde_json::json!({ "email": email, "code": code.as_str() }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_owned()
    }
}

/// Configuration for tests. The database URL is never dialed; the store is
/// injected.
fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        jwt_secret: SecretString::from("k9#mQ2$vX7!pL4@wN8%rT3^bF6&hJ1*z"),
        smtp: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

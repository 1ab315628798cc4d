// Common test utilities and helpers

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::AppState;
use crate::config::{AuthConfig, Config, LocaleConfig, LocalePrefix};
use crate::models::{SessionClaims, SessionTokens};
use crate::services::{AuthBackend, AuthBackendError, RefreshOutcome, SessionRefresher};

/// Secret the fake auth service signs access tokens with
pub const TEST_JWT_SECRET: &str = "test-secret";

/// Auth config pointing nowhere, with a short timeout
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        url: "http://127.0.0.1:9".to_string(),
        anon_key: "anon-key".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        timeout_ms: 100,
        ..AuthConfig::default()
    }
}

/// Locales sq (default), en, it
pub fn test_locale_config(prefix: LocalePrefix) -> LocaleConfig {
    LocaleConfig { prefix, ..LocaleConfig::default() }
}

pub fn test_config(prefix: LocalePrefix) -> Config {
    Config {
        auth: test_auth_config(),
        locale: test_locale_config(prefix),
        ..Config::default()
    }
}

/// Gateway state whose refresher talks to `backend`
pub fn test_state(prefix: LocalePrefix, backend: Arc<dyn AuthBackend>) -> Arc<AppState> {
    let config = test_config(prefix);
    let refresher = SessionRefresher::new(backend, &config.auth);
    Arc::new(AppState::with_refresher(config, refresher))
}

fn sign_token(sub: &str, expires_in: i64, secret: &str) -> String {
    let claims = SessionClaims { sub: sub.to_string(), exp: Utc::now().timestamp() + expires_in };
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("Failed to encode test token")
}

/// HS256 access token for `sub` expiring `expires_in` seconds from now
pub fn make_access_token(sub: &str, expires_in: i64) -> String {
    sign_token(sub, expires_in, TEST_JWT_SECRET)
}

/// Well-formed token signed with a secret the gateway does not know
pub fn make_forged_token(sub: &str, expires_in: i64) -> String {
    sign_token(sub, expires_in, "attacker-chosen")
}

/// `sb-session=<tokens>` carrying a forged access token
pub fn forged_cookie_header(sub: &str, expires_in: i64) -> String {
    let tokens = SessionTokens::new(make_forged_token(sub, expires_in), "refresh-forged");
    format!("sb-session={}", tokens.to_cookie_value())
}

pub fn session_tokens(sub: &str, expires_in: i64) -> SessionTokens {
    SessionTokens::new(make_access_token(sub, expires_in), format!("refresh-{}", sub))
}

/// `sb-session=<tokens>` for a `Cookie` header
pub fn session_cookie_header(sub: &str, expires_in: i64) -> String {
    format!("sb-session={}", session_tokens(sub, expires_in).to_cookie_value())
}

/// Answers every refresh with the same outcome and counts calls
pub struct FixedBackend {
    outcome: RefreshOutcome,
    calls: AtomicUsize,
}

impl FixedBackend {
    pub fn new(outcome: RefreshOutcome) -> Self {
        Self { outcome, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthBackend for FixedBackend {
    async fn refresh_session(
        &self,
        _tokens: &SessionTokens,
    ) -> Result<RefreshOutcome, AuthBackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcome.clone())
    }
}

/// Simulates an unreachable auth service
pub struct FailingBackend;

#[async_trait]
impl AuthBackend for FailingBackend {
    async fn refresh_session(
        &self,
        _tokens: &SessionTokens,
    ) -> Result<RefreshOutcome, AuthBackendError> {
        Err(AuthBackendError::Unreachable("connection refused".to_string()))
    }
}

/// Answers only after the given delay
pub struct SlowBackend(pub Duration);

#[async_trait]
impl AuthBackend for SlowBackend {
    async fn refresh_session(
        &self,
        _tokens: &SessionTokens,
    ) -> Result<RefreshOutcome, AuthBackendError> {
        tokio::time::sleep(self.0).await;
        Ok(RefreshOutcome::Revoked)
    }
}

/// Serve `router` on an ephemeral local port
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server failed");
    });
    addr
}

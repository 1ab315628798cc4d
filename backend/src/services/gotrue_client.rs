use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::AuthConfig;
use crate::models::SessionTokens;
use crate::services::auth_backend::{AuthBackend, AuthBackendError, RefreshOutcome};
use crate::utils::JwtUtil;

/// HTTP client for a GoTrue-compatible auth service.
pub struct GoTrueClient {
    http_client: Client,
    base_url: String,
    anon_key: String,
    jwt: JwtUtil,
    refresh_margin_secs: i64,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

impl GoTrueClient {
    pub fn new(config: &AuthConfig) -> Self {
        let timeout = config.timeout();
        let http_client = Client::builder().timeout(timeout).build().unwrap_or_default();

        Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            jwt: JwtUtil::new(&config.jwt_secret),
            refresh_margin_secs: config.refresh_margin(),
            timeout,
        }
    }

    fn token_url(&self) -> String {
        format!("{}/auth/v1/token?grant_type=refresh_token", self.base_url)
    }

    /// Whether the session has to go to the auth service. Only an
    /// authentic access token outside the refresh margin skips the call.
    fn needs_refresh(&self, tokens: &SessionTokens) -> bool {
        match self.jwt.verify_token(&tokens.access_token) {
            Ok(claims) => claims.expires_within(Utc::now().timestamp(), self.refresh_margin_secs),
            Err(e) => {
                tracing::debug!("Access token not verified locally ({}), asking auth backend", e);
                true
            },
        }
    }
}

#[async_trait]
impl AuthBackend for GoTrueClient {
    async fn refresh_session(
        &self,
        tokens: &SessionTokens,
    ) -> Result<RefreshOutcome, AuthBackendError> {
        if !self.needs_refresh(tokens) {
            tracing::debug!("Access token still fresh, skipping refresh");
            return Ok(RefreshOutcome::Unchanged);
        }

        let url = self.token_url();
        tracing::debug!("Refreshing session via {}", url);

        let body = serde_json::json!({
            "refresh_token": tokens.refresh_token
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthBackendError::Timeout(self.timeout)
                } else {
                    AuthBackendError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if matches!(status.as_u16(), 400 | 401 | 403) {
            let error_text = response.text().await.unwrap_or_default();
            tracing::info!("Auth backend rejected refresh token ({}): {}", status, error_text);
            return Ok(RefreshOutcome::Revoked);
        }

        if !status.is_success() {
            return Err(AuthBackendError::UnexpectedStatus { status: status.as_u16() });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthBackendError::InvalidResponse(e.to_string()))?;

        if token.access_token.is_empty() || token.refresh_token.is_empty() {
            return Err(AuthBackendError::InvalidResponse("empty token in response".to_string()));
        }

        tracing::debug!("Session renewed by auth backend");
        Ok(RefreshOutcome::Renewed(SessionTokens::new(token.access_token, token.refresh_token)))
    }
}

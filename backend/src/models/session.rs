use serde::{Deserialize, Serialize};

/// Token pair stored in the session cookie as percent-encoded JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl SessionTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }

    pub fn to_cookie_value(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        urlencoding::encode(&json).into_owned()
    }

    pub fn from_cookie_value(value: &str) -> Option<Self> {
        let json = urlencoding::decode(value).ok()?;
        let tokens: Self = serde_json::from_str(&json).ok()?;
        if tokens.refresh_token.is_empty() {
            return None;
        }
        Some(tokens)
    }
}

/// The subset of access-token claims the gateway cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: i64,
}

impl SessionClaims {
    pub fn is_expired(&self, now: i64) -> bool {
        self.exp <= now
    }

    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        self.exp.saturating_sub(now) <= margin_secs
    }
}

/// Authenticated user id, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub String);

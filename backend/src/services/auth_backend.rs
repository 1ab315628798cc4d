use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::SessionTokens;

/// Result of asking the auth backend about a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Session is valid as-is; nothing to send back.
    Unchanged,
    /// Backend issued a new token pair.
    Renewed(SessionTokens),
    /// Backend rejected the session; the cookie should be cleared.
    Revoked,
}

#[derive(Error, Debug)]
pub enum AuthBackendError {
    #[error("auth backend unreachable: {0}")]
    Unreachable(String),

    #[error("auth backend returned unexpected status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("auth backend returned invalid data: {0}")]
    InvalidResponse(String),

    #[error("auth backend timed out after {0:?}")]
    Timeout(Duration),
}

/// Session validate/refresh operation of the hosted auth service.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn refresh_session(
        &self,
        tokens: &SessionTokens,
    ) -> Result<RefreshOutcome, AuthBackendError>;
}

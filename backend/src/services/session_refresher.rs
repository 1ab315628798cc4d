//! Session Refresher
//!
//! First pipeline stage. Hands the request's session cookie to the auth
//! backend and stages whatever cookie change the backend asks for. It
//! never decides routing and never fails: backend trouble degrades to a
//! pass-through carrier with no cookie change.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::AuthConfig;
use crate::models::{
    CookieAttributes, InboundRequest, ResponseCarrier, ResponseCookie, SameSite, SessionTokens,
    SessionUser,
};
use crate::services::auth_backend::{AuthBackend, RefreshOutcome};
use crate::services::gotrue_client::GoTrueClient;
use crate::utils::JwtUtil;

pub struct SessionRefresher {
    backend: Option<Arc<dyn AuthBackend>>,
    cookie_name: String,
    cookie_attributes: CookieAttributes,
    jwt: JwtUtil,
    timeout: Duration,
}

impl SessionRefresher {
    pub fn new(backend: Arc<dyn AuthBackend>, config: &AuthConfig) -> Self {
        Self { backend: Some(backend), ..Self::disabled(config) }
    }

    /// A refresher that never contacts a backend.
    pub fn disabled(config: &AuthConfig) -> Self {
        Self {
            backend: None,
            cookie_name: config.cookie_name.clone(),
            cookie_attributes: CookieAttributes {
                path: "/".to_string(),
                domain: config.cookie_domain.clone(),
                max_age: Some(config.cookie_max_age()),
                http_only: true,
                secure: config.secure_cookies,
                same_site: SameSite::Lax,
            },
            jwt: JwtUtil::new(&config.jwt_secret),
            timeout: config.timeout(),
        }
    }

    /// GoTrue-backed refresher, or a disabled one when no auth URL is set.
    pub fn from_config(config: &AuthConfig) -> Self {
        if config.enabled() {
            Self::new(Arc::new(GoTrueClient::new(config)), config)
        } else {
            Self::disabled(config)
        }
    }

    /// Refresh the request's session.
    ///
    /// `None` when there is nothing to refresh (no session cookie, or no
    /// backend configured). Otherwise a pass-through carrier holding at
    /// most one cookie: the renewed session, or its removal.
    pub async fn refresh(&self, request: &InboundRequest) -> Option<ResponseCarrier> {
        let backend = self.backend.as_ref()?;
        let raw = request.cookie(&self.cookie_name)?;

        let mut carrier = ResponseCarrier::pass_through();

        let Some(tokens) = SessionTokens::from_cookie_value(&raw) else {
            tracing::debug!("Unreadable {} cookie on {}, clearing it", self.cookie_name, request.path());
            carrier.set_cookie(self.removal_cookie());
            return Some(carrier);
        };

        match tokio::time::timeout(self.timeout, backend.refresh_session(&tokens)).await {
            Ok(Ok(RefreshOutcome::Unchanged)) => {},
            Ok(Ok(RefreshOutcome::Renewed(renewed))) => {
                tracing::debug!("Session renewed for {}", request.path());
                carrier.set_cookie(self.session_cookie(&renewed));
            },
            Ok(Ok(RefreshOutcome::Revoked)) => {
                tracing::debug!("Session revoked, clearing {}", self.cookie_name);
                carrier.set_cookie(self.removal_cookie());
            },
            Ok(Err(e)) => {
                tracing::warn!("Session refresh failed, keeping current session: {}", e);
            },
            Err(_) => {
                tracing::warn!(
                    "Session refresh timed out after {:?}, keeping current session",
                    self.timeout
                );
            },
        }

        Some(carrier)
    }

    /// The user the downstream handlers should see once `carrier` is
    /// applied to `request`. Only an authentic, unexpired access token
    /// names a user.
    pub fn effective_user(
        &self,
        request: &InboundRequest,
        carrier: &ResponseCarrier,
    ) -> Option<SessionUser> {
        let value = match carrier.cookie(&self.cookie_name) {
            Some(cookie) if cookie.is_removal() => return None,
            Some(cookie) => cookie.value.clone(),
            None => request.cookie(&self.cookie_name)?,
        };
        let tokens = SessionTokens::from_cookie_value(&value)?;
        let claims = match self.jwt.verify_token(&tokens.access_token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Session token not trusted, no user forwarded: {}", e);
                return None;
            },
        };
        if claims.is_expired(Utc::now().timestamp()) {
            return None;
        }
        Some(SessionUser(claims.sub))
    }

    fn session_cookie(&self, tokens: &SessionTokens) -> ResponseCookie {
        ResponseCookie::new(&self.cookie_name, tokens.to_cookie_value())
            .with_attributes(self.cookie_attributes.clone())
    }

    fn removal_cookie(&self) -> ResponseCookie {
        ResponseCookie::removal(&self.cookie_name, self.cookie_attributes.clone())
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_i18n::t;
use serde::Serialize;
use thiserror::Error;

use super::i18n::get_locale;

/// Errors surfaced by the JSON API and the page handler.
///
/// The edge pipeline itself never fails; these only cover the gateway's
/// own endpoints and the upstream proxy.
#[derive(Error, Debug)]
pub enum ApiError {
    // Upstream errors 2xxx
    #[error("Upstream renderer unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Upstream renderer timeout")]
    UpstreamTimeout,

    // Resource errors 3xxx
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Locale {code} not supported")]
    LocaleNotFound { code: String },

    // Validation errors 4xxx
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // System errors 5xxx
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable { message: message.into() }
    }

    pub fn locale_not_found(code: impl Into<String>) -> Self {
        Self::LocaleNotFound { code: code.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::ResourceNotFound(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn error_code(&self) -> i32 {
        match self {
            Self::UpstreamUnavailable { .. } => 2001,
            Self::UpstreamTimeout => 2002,

            Self::ResourceNotFound(_) => 3000,
            Self::LocaleNotFound { .. } => 3001,

            Self::InvalidInput(_) => 4001,

            Self::Other(_) => 5001,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.error_code() {
            2002 => StatusCode::GATEWAY_TIMEOUT,
            2001..=2999 => StatusCode::BAD_GATEWAY,
            3000..=3999 => StatusCode::NOT_FOUND,
            4001..=4999 => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get localized error message based on current locale
    pub fn localized_message(&self) -> String {
        let locale = get_locale();
        match self {
            Self::UpstreamUnavailable { message } => {
                t!("upstream.unavailable", locale = &locale, message = message).to_string()
            },
            Self::UpstreamTimeout => t!("upstream.timeout", locale = &locale).to_string(),
            Self::ResourceNotFound(name) => {
                t!("resource.not_found", locale = &locale, name = name).to_string()
            },
            Self::LocaleNotFound { code } => {
                t!("locale.not_found", locale = &locale, code = code).to_string()
            },
            Self::InvalidInput(msg) => msg.clone(),
            Self::Other(err) => {
                t!("internal.error", locale = &locale, message = err.to_string()).to_string()
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub code: i32,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let response = ApiErrorResponse { code: self.error_code(), message: self.localized_message() };
        (status, Json(response)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

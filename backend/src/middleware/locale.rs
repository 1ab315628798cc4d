//! Message locale middleware
//!
//! Picks the locale gateway-generated messages (errors, placeholder page)
//! are rendered in and scopes it to the request's task.

use axum::{
    extract::{Request, State},
    http::header::ACCEPT_LANGUAGE,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::AppState;
use crate::models::ResolvedLocale;
use crate::utils::{negotiate_from_header, with_locale};

/// Page requests reuse the locale the edge pipeline resolved; requests
/// that bypass the pipeline (API, files) negotiate from `Accept-Language`.
pub async fn locale_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let locale_config = &state.config.locale;

    let locale = match req.extensions().get::<ResolvedLocale>() {
        Some(resolved) => resolved.0.clone(),
        None => {
            let header = req.headers().get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
            negotiate_from_header(header, &locale_config.locales)
                .unwrap_or(&locale_config.default_locale)
                .to_string()
        },
    };

    with_locale(locale, next.run(req)).await
}

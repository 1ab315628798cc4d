//! Page handler
//!
//! Everything the API router does not claim lands here. Pages are rendered
//! by the upstream storefront; the gateway only relays. Without an upstream
//! a small localized placeholder stands in.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use rust_i18n::t;

use crate::AppState;
use crate::models::{ResolvedLocale, SessionUser};
use crate::utils::{ApiError, ApiResult, get_locale};

/// Headers that describe one connection, never forwarded either way.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Headers the gateway sets for the upstream; client copies are dropped.
pub const RESOLVED_LOCALE_HEADER: &str = "x-resolved-locale";
pub const SESSION_USER_HEADER: &str = "x-session-user";

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub async fn render_page(State(state): State<Arc<AppState>>, req: Request) -> ApiResult<Response> {
    if state.config.upstream.url.is_empty() {
        if !state.route_matcher.matches(req.uri().path()) {
            return Err(ApiError::not_found(req.uri().path().to_string()));
        }
        return Ok(placeholder_page(&req));
    }

    proxy_to_upstream(&state, req).await
}

fn placeholder_page(req: &Request) -> Response {
    let locale = req
        .extensions()
        .get::<ResolvedLocale>()
        .map(|resolved| resolved.0.clone())
        .unwrap_or_else(get_locale);

    let title = t!("page.title", locale = &locale);
    let message = t!("page.placeholder", locale = &locale, lang = &locale);

    Html(format!(
        "<!doctype html>\n<html lang=\"{locale}\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body><h1>{title}</h1><p>{message}</p></body>\n</html>\n"
    ))
    .into_response()
}

async fn proxy_to_upstream(state: &AppState, req: Request) -> ApiResult<Response> {
    let (parts, body) = req.into_parts();
    let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = format!("{}{}", state.config.upstream.url.trim_end_matches('/'), path_and_query);

    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::invalid_input(format!("Request body rejected: {}", e)))?;

    let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
        .map_err(|e| ApiError::invalid_input(format!("Unsupported method: {}", e)))?;

    tracing::debug!("Proxying {} {}", parts.method, url);

    let mut upstream = state.http_client.request(method, &url);
    for (name, value) in parts.headers.iter() {
        let name = name.as_str();
        if is_hop_by_hop(name) || name == RESOLVED_LOCALE_HEADER || name == SESSION_USER_HEADER {
            continue;
        }
        upstream = upstream.header(name, value.as_bytes());
    }
    if let Some(locale) = parts.extensions.get::<ResolvedLocale>() {
        upstream = upstream.header(RESOLVED_LOCALE_HEADER, locale.0.as_str());
    }
    if let Some(user) = parts.extensions.get::<SessionUser>() {
        upstream = upstream.header(SESSION_USER_HEADER, user.0.as_str());
    }

    let upstream_response = upstream.body(body).send().await.map_err(|e| {
        if e.is_timeout() {
            ApiError::UpstreamTimeout
        } else {
            ApiError::upstream_unavailable(e.to_string())
        }
    })?;

    let status =
        StatusCode::from_u16(upstream_response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut headers = HeaderMap::new();
    for (name, value) in upstream_response.headers() {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }

    let bytes: Bytes = upstream_response
        .bytes()
        .await
        .map_err(|e| ApiError::upstream_unavailable(e.to_string()))?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS.iter().any(|hop| name.eq_ignore_ascii_case(hop))
}

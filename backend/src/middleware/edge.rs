use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::AppState;
use crate::models::{Disposition, InboundRequest, ResolvedLocale, ResponseCarrier};
use crate::services::locale_resolver::locale_of;

/// Edge middleware: runs the session/locale pipeline for page requests.
/// 1. Skip paths the route matcher excludes
/// 2. Run refresher + resolver, merge the carriers
/// 3. Redirect, or rewrite/forward with refreshed cookies and the resolved locale
/// 4. Attach the merged `Set-Cookie` headers to whatever comes back
pub async fn edge_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    if !state.route_matcher.matches(req.uri().path()) {
        return next.run(req).await;
    }

    let inbound = InboundRequest::from_parts(req.method(), req.uri(), req.headers());
    let carrier = state.pipeline.process(&inbound).await;

    tracing::debug!(
        "Edge pipeline {} {} -> {} (cookies: {:?})",
        inbound.method(),
        inbound.path(),
        carrier.disposition,
        carrier.cookie_names()
    );

    let mut response = match &carrier.disposition {
        Disposition::Redirect(target) => redirect_response(target),
        Disposition::Rewrite(target) => {
            rewrite_uri(&mut req, target);
            prepare_downstream(&state, &inbound, &carrier, &mut req);
            next.run(req).await
        },
        Disposition::Next => {
            prepare_downstream(&state, &inbound, &carrier, &mut req);
            next.run(req).await
        },
    };

    append_set_cookies(response.headers_mut(), &carrier);
    response
}

fn redirect_response(target: &str) -> Response {
    match HeaderValue::from_str(target) {
        Ok(location) => (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response(),
        Err(_) => {
            tracing::warn!("Redirect target is not a valid header value: {:?}", target);
            (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, HeaderValue::from_static("/"))])
                .into_response()
        },
    }
}

fn rewrite_uri(req: &mut Request, target: &str) {
    match target.parse::<Uri>() {
        Ok(uri) => *req.uri_mut() = uri,
        Err(e) => tracing::warn!("Rewrite target {:?} is not a valid URI: {}", target, e),
    }
}

/// Make the carrier's effect visible to the handlers behind the gateway.
fn prepare_downstream(
    state: &AppState,
    inbound: &InboundRequest,
    carrier: &ResponseCarrier,
    req: &mut Request,
) {
    match inbound.cookie_header_with(carrier).map(|value| HeaderValue::from_str(&value)) {
        Some(Ok(cookie)) => {
            req.headers_mut().insert(header::COOKIE, cookie);
        },
        Some(Err(e)) => tracing::warn!("Merged cookie header rejected: {}", e),
        None => {
            req.headers_mut().remove(header::COOKIE);
        },
    }

    let locale_config = state.pipeline.locale_config();
    let locale = locale_of(req.uri().path(), locale_config)
        .unwrap_or(&locale_config.default_locale)
        .to_string();
    req.extensions_mut().insert(ResolvedLocale(locale));

    if let Some(user) = state.pipeline.refresher().effective_user(inbound, carrier) {
        req.extensions_mut().insert(user);
    }
}

fn append_set_cookies(headers: &mut HeaderMap, carrier: &ResponseCarrier) {
    for cookie in carrier.cookies() {
        match HeaderValue::from_str(&cookie.to_header_value()) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            },
            Err(e) => tracing::warn!("Dropping cookie {} with invalid value: {}", cookie.name, e),
        }
    }
}

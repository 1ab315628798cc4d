//! Storefront edge gateway
//!
//! Sits in front of the storefront renderer: refreshes the auth session,
//! resolves the locale-prefixed route, and merges both into one response.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

rust_i18n::i18n!("locales", fallback = "en");

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Request},
    middleware as axum_middleware,
    routing::get,
};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::middleware::RouteMatcher;
use crate::services::{EdgePipeline, SessionRefresher};

pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<EdgePipeline>,
    pub route_matcher: RouteMatcher,
    /// Client for the upstream renderer.
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let refresher = SessionRefresher::from_config(&config.auth);
        Self::with_refresher(config, refresher)
    }

    /// Build state around an explicit refresher (alternate auth backends).
    pub fn with_refresher(config: Config, refresher: SessionRefresher) -> Self {
        let locale = Arc::new(config.locale.clone());
        let http_client = reqwest::Client::builder()
            .timeout(config.upstream.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();

        Self {
            route_matcher: RouteMatcher::from_config(&config.routing),
            pipeline: Arc::new(EdgePipeline::new(locale, refresher)),
            config: Arc::new(config),
            http_client,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::locale::list_locales,
        handlers::locale::get_locale,
    ),
    components(schemas(
        models::HealthResponse,
        models::LocaleListResponse,
        models::LocaleDetailResponse,
    )),
    tags(
        (name = "System", description = "Gateway status"),
        (name = "Locales", description = "Storefront locale table"),
    )
)]
pub struct ApiDoc;

#[derive(Clone, Copy, Default)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()).ok().map(RequestId::new)
    }
}

/// The full gateway router: JSON API, API docs, and the page fallback
/// behind the edge pipeline.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/locales", get(handlers::locale::list_locales))
        .route("/api/locales/:code", get(handlers::locale::get_locale));

    Router::new()
        .merge(api)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::page::render_page)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::locale_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(state.clone(), middleware::edge_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
        .with_state(state)
}

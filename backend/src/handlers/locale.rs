use std::sync::Arc;

use axum::{Json, extract::Path, extract::State};

use crate::AppState;
use crate::config::LocalePrefix;
use crate::models::{LocaleDetailResponse, LocaleListResponse};
use crate::utils::{ApiError, ApiResult};

/// List the storefront locales
#[utoipa::path(
    get,
    path = "/api/locales",
    responses(
        (status = 200, description = "Configured locales", body = LocaleListResponse)
    ),
    tag = "Locales"
)]
pub async fn list_locales(State(state): State<Arc<AppState>>) -> Json<LocaleListResponse> {
    let config = state.pipeline.locale_config();
    Json(LocaleListResponse {
        locales: config.locales.clone(),
        default_locale: config.default_locale.clone(),
        prefix: config.prefix,
    })
}

/// Get one locale and the path prefix its pages use
#[utoipa::path(
    get,
    path = "/api/locales/{code}",
    params(("code" = String, Path, description = "Locale code, e.g. sq")),
    responses(
        (status = 200, description = "Locale detail", body = LocaleDetailResponse),
        (status = 404, description = "Locale not supported"),
    ),
    tag = "Locales"
)]
pub async fn get_locale(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<Json<LocaleDetailResponse>> {
    let config = state.pipeline.locale_config();
    let Some(locale) = config.canonical(&code) else {
        tracing::debug!("Unknown locale requested: {}", code);
        return Err(ApiError::locale_not_found(code));
    };

    let is_default = locale == config.default_locale;
    let path_prefix = match config.prefix {
        LocalePrefix::AsNeeded if is_default => String::new(),
        _ => format!("/{}", locale),
    };

    Ok(Json(LocaleDetailResponse { code: locale.to_string(), is_default, path_prefix }))
}

use serde::Serialize;
use utoipa::ToSchema;

use crate::config::LocalePrefix;

/// Locale the current request renders in, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocale(pub String);

#[derive(Debug, Serialize, ToSchema)]
pub struct LocaleListResponse {
    pub locales: Vec<String>,
    pub default_locale: String,
    #[schema(value_type = String, example = "always")]
    pub prefix: LocalePrefix,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocaleDetailResponse {
    pub code: String,
    pub is_default: bool,
    /// Path prefix pages in this locale are served under; empty when the
    /// locale is served unprefixed.
    pub path_prefix: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

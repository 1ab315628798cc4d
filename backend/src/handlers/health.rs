use axum::Json;

use crate::models::HealthResponse;

/// Liveness check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Gateway is up", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

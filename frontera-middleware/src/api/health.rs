use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::openapi::HEALTH_TAG;
use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
struct Health {
    status: &'static str,
}

/// Liveness probe, open by design.
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Server is up", body = Health)
    )
)]
async fn health_check() -> impl IntoResponse {
    Json(Health { status: "ok" })
}

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

mod auth;
mod health;
pub(crate) mod proxy;
mod session_middleware;

use axum::routing::any;
use axum::{middleware, Router};

use crate::state::AppState;

/// All routes plus the proxy fallback, wrapped in the session middleware.
/// The middleware decides which paths are public, so it is layered over the
/// fallback too.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .route("/google-auth", any(auth::google_auth))
        .route("/azure-ad-auth", any(auth::azure_ad_auth))
        .route("/callback/google-auth", any(auth::google_callback))
        .route("/callback/azure-ad-auth", any(auth::azure_callback))
        .route("/enable/google-sync", any(auth::enable_google_sync))
        .route("/enable/azure-ad-sync", any(auth::enable_azure_ad_sync))
        .route("/session", any(auth::session))
        .fallback(any(proxy::forward_to_upstream))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware::verify_session,
        ))
}

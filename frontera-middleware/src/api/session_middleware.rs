use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::AUTHORIZATION;
use log::warn;

use crate::errors::ApiError;
use crate::state::AppState;
use crate::token::TokenError;

/// Paths (prefix match) reachable without a session: the login entry points,
/// the provider callbacks, and liveness.
pub(crate) const PUBLIC_PATHS: &[&str] = &[
    "/google-auth",
    "/callback/google-auth",
    "/azure-ad-auth",
    "/callback/azure-ad-auth",
    "/health",
];

/// Verifies the bearer session token on every non-public request and attaches
/// the decoded claims to the request extensions. One attempt, failures are
/// terminal for the request.
pub(super) async fn verify_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if PUBLIC_PATHS.iter().any(|public| path.starts_with(public)) {
        return next.run(request).await;
    }

    let Some(header) = request.headers().get(AUTHORIZATION) else {
        warn!("rejecting {path}: no authorization header");
        return ApiError::bad_request("missing authorization header").into_response();
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.split_whitespace().nth(1));
    let Some(token) = token else {
        warn!("rejecting {path}: authorization header has no token");
        return ApiError::bad_request("invalid token format").into_response();
    };

    match state.session_signer.verify(token) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => {
            match err {
                TokenError::Expired => warn!("rejecting {path}: session expired"),
                _ => warn!("rejecting {path}: {err}"),
            }
            ApiError::unauthorized("invalid authorization token").into_response()
        }
    }
}

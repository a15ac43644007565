use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::errors::ApiError;
use crate::issuer::IssuedSession;
use crate::openapi::AUTH_TAG;
use crate::providers::{OAuthAdapter, Provider};
use crate::state::AppState;
use crate::token::{OAuthState, SessionClaims};

/// Where the client app lands after a plain login.
const DEFAULT_ORIGIN: &str = "/finder";

const GOOGLE_LOGIN_SCOPES: &[&str] = &["openid", "email", "profile"];
const GOOGLE_SYNC_SCOPES: &[&str] = &[
    "openid",
    "email",
    "profile",
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/calendar.readonly",
];
const AZURE_LOGIN_SCOPES: &[&str] = &["email", "openid", "profile", "User.Read"];
const AZURE_SYNC_SCOPES: &[&str] = &[
    "email",
    "openid",
    "User.Read",
    "profile",
    "Mail.ReadWrite",
    "Mail.Read",
    "Mail.Send",
];

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub(super) struct AuthUrlResponse {
    /// Provider authorization URL the browser should navigate to
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct EnableSyncQuery {
    origin: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Start a Google login.
#[utoipa::path(
    get,
    path = "/google-auth",
    tag = AUTH_TAG,
    responses(
        (status = 200, description = "Authorization URL to redirect the browser to", body = AuthUrlResponse)
    )
)]
pub(super) async fn google_auth(State(state): State<AppState>) -> Response {
    auth_url_response(
        state.google.as_ref(),
        GOOGLE_LOGIN_SCOPES,
        &OAuthState::login(DEFAULT_ORIGIN),
        false,
    )
}

/// Start an Azure AD login.
#[utoipa::path(
    get,
    path = "/azure-ad-auth",
    tag = AUTH_TAG,
    responses(
        (status = 200, description = "Authorization URL to redirect the browser to", body = AuthUrlResponse)
    )
)]
pub(super) async fn azure_ad_auth(State(state): State<AppState>) -> Response {
    auth_url_response(
        state.azure_ad.as_ref(),
        AZURE_LOGIN_SCOPES,
        &OAuthState::login(DEFAULT_ORIGIN),
        false,
    )
}

/// Start an incremental-consent flow adding Gmail/Calendar scopes for the
/// signed-in user's workspace.
#[utoipa::path(
    get,
    path = "/enable/google-sync",
    tag = AUTH_TAG,
    responses(
        (status = 200, body = AuthUrlResponse)
    )
)]
pub(super) async fn enable_google_sync(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
    Query(query): Query<EnableSyncQuery>,
) -> Response {
    auth_url_response(
        state.google.as_ref(),
        GOOGLE_SYNC_SCOPES,
        &sync_state(&session, query),
        true,
    )
}

/// Same as the Google variant, adding Microsoft Mail scopes.
#[utoipa::path(
    get,
    path = "/enable/azure-ad-sync",
    tag = AUTH_TAG,
    responses(
        (status = 200, body = AuthUrlResponse)
    )
)]
pub(super) async fn enable_azure_ad_sync(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
    Query(query): Query<EnableSyncQuery>,
) -> Response {
    auth_url_response(
        state.azure_ad.as_ref(),
        AZURE_SYNC_SCOPES,
        &sync_state(&session, query),
        true,
    )
}

fn sync_state(session: &SessionClaims, query: EnableSyncQuery) -> OAuthState {
    OAuthState {
        origin: query.origin.unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
        tenant: Some(session.tenant.clone()),
        kind: query.kind,
        email: Some(session.profile.email.clone()),
    }
}

fn auth_url_response(
    adapter: &dyn OAuthAdapter,
    scopes: &[&str],
    state: &OAuthState,
    prompt_consent: bool,
) -> Response {
    match adapter.authorization_url(scopes, state, prompt_consent) {
        Ok(url) => Json(AuthUrlResponse { url }).into_response(),
        Err(err) => {
            error!("failed to build authorization URL: {err}");
            ApiError::internal("failed to build authorization URL").into_response()
        }
    }
}

/// Google redirect target: trades the code for tokens, issues a session and
/// sends the browser back to the client app.
#[utoipa::path(
    get,
    path = "/callback/google-auth",
    tag = AUTH_TAG,
    responses(
        (status = 303, description = "Redirect to the client app success or failure page")
    )
)]
pub(super) async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    run_callback(&state, Provider::Google, query).await
}

/// Azure AD redirect target. Provider-reported errors short-circuit into a
/// failure redirect before any token exchange.
#[utoipa::path(
    get,
    path = "/callback/azure-ad-auth",
    tag = AUTH_TAG,
    responses(
        (status = 303, description = "Redirect to the client app success or failure page")
    )
)]
pub(super) async fn azure_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error.as_deref() {
        error!("azure-ad login error: {error}");
        let message = match error {
            "access_denied" => "You have canceled the login process. Please try again.",
            "consent_required" => {
                "You have declined the consent. The consent is required to proceed. Please try again."
            }
            other => other,
        };
        return redirect_to_failure(&state.config.client_app_url, message);
    }
    run_callback(&state, Provider::AzureAd, query).await
}

async fn run_callback(state: &AppState, provider: Provider, query: CallbackQuery) -> Response {
    let client_app_url = &state.config.client_app_url;

    let Some(raw_state) = query.state else {
        return redirect_to_failure(client_app_url, "missing state parameter");
    };
    let oauth_state = match OAuthState::decode(&raw_state) {
        Ok(decoded) => decoded,
        Err(err) => return redirect_to_failure(client_app_url, &err.to_string()),
    };
    let Some(code) = query.code else {
        return redirect_to_failure(client_app_url, "missing authorization code");
    };

    match login(state, provider, &code, oauth_state).await {
        Ok(issued) => {
            info!("issued session via {}", provider.as_str());
            redirect_to_success(client_app_url, &issued)
        }
        Err(message) => redirect_to_failure(client_app_url, &message),
    }
}

/// The full login leg: exchange, profile fetch, session issue. Any failure
/// collapses into the message shown on the client's failure page.
async fn login(
    state: &AppState,
    provider: Provider,
    code: &str,
    oauth_state: OAuthState,
) -> Result<IssuedSession, String> {
    let adapter: &dyn OAuthAdapter = match provider {
        Provider::Google => state.google.as_ref(),
        Provider::AzureAd => state.azure_ad.as_ref(),
    };

    let tokens = adapter.exchange_code(code).await.map_err(|err| {
        error!("{} token exchange failed: {err}", provider.as_str());
        err.to_string()
    })?;
    let profile = adapter
        .fetch_profile(&tokens.access_token)
        .await
        .map_err(|err| {
            error!("{} profile fetch failed: {err}", provider.as_str());
            err.to_string()
        })?;
    state
        .issuer
        .issue(provider, tokens, profile, oauth_state)
        .await
        .map_err(|err| {
            error!("session issue failed: {err}");
            err.to_string()
        })
}

fn redirect_to_success(client_app_url: &str, issued: &IssuedSession) -> Response {
    redirect_to(client_app_url, "/auth/success", &[
        ("sessionToken", issued.session_token.as_str()),
        ("origin", issued.origin.as_str()),
    ])
}

fn redirect_to_failure(client_app_url: &str, message: &str) -> Response {
    redirect_to(client_app_url, "/auth/failure", &[("message", message)])
}

fn redirect_to(client_app_url: &str, path: &str, params: &[(&str, &str)]) -> Response {
    let mut url = match Url::parse(&format!("{client_app_url}{path}")) {
        Ok(url) => url,
        Err(err) => {
            error!("client app URL is not parseable: {err}");
            return ApiError::internal("invalid client app URL").into_response();
        }
    };
    for (name, value) in params {
        url.query_pairs_mut().append_pair(name, value);
    }
    Redirect::to(url.as_str()).into_response()
}

/// Echo the verified session back to the client.
#[utoipa::path(
    get,
    path = "/session",
    tag = AUTH_TAG,
    responses(
        (status = 200, description = "The decoded session claims, or null")
    )
)]
pub(super) async fn session(session: Option<Extension<SessionClaims>>) -> Response {
    Json(json!({ "session": session.map(|Extension(claims)| claims) })).into_response()
}

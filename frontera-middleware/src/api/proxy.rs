use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use http::header::HOST;
use http::{HeaderName, HeaderValue, Method, StatusCode};
use log::{error, warn};

use crate::config::MiddlewareConfig;
use crate::customer_os::{API_KEY_HEADER, MAIL_API_KEY_HEADER};
use crate::errors::ApiError;
use crate::state::AppState;

/// One proxied upstream: requests whose path starts with `prefix` go to
/// `target` with exactly this credential header injected.
#[derive(Debug, Clone)]
pub struct ProxyRoute {
    pub prefix: &'static str,
    pub target: String,
    pub header_name: HeaderName,
    pub header_value: HeaderValue,
}

impl ProxyRoute {
    fn new(prefix: &'static str, target: String, header_name: &str, api_key: &str) -> Self {
        Self {
            prefix,
            target,
            header_name: header_name
                .parse()
                .expect("credential header name is valid"),
            header_value: api_key.parse().expect("API key is a valid header value"),
        }
    }
}

/// Route table, ordered longest prefix first so `/customer-os-api` can never
/// shadow `/customer-os-stream`.
pub fn routes_for(config: &MiddlewareConfig) -> Vec<ProxyRoute> {
    let upstreams = &config.upstreams;
    let mut routes = vec![
        ProxyRoute::new(
            "/customer-os-api",
            format!("{}/query", upstreams.customer_os_url),
            API_KEY_HEADER,
            &upstreams.customer_os_api_key,
        ),
        ProxyRoute::new(
            "/customer-os-stream",
            format!("{}/stream", upstreams.customer_os_url),
            API_KEY_HEADER,
            &upstreams.customer_os_api_key,
        ),
        ProxyRoute::new(
            "/sa",
            upstreams.settings_url.clone(),
            API_KEY_HEADER,
            &upstreams.settings_api_key,
        ),
        ProxyRoute::new(
            "/ua",
            upstreams.user_admin_url.clone(),
            API_KEY_HEADER,
            &upstreams.user_admin_api_key,
        ),
        ProxyRoute::new(
            "/fs",
            upstreams.file_storage_url.clone(),
            API_KEY_HEADER,
            &upstreams.file_storage_api_key,
        ),
        ProxyRoute::new(
            "/comms-api",
            upstreams.comms_url.clone(),
            MAIL_API_KEY_HEADER,
            &upstreams.comms_mail_api_key,
        ),
    ];
    routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    routes
}

/// Longest-prefix match on path-segment boundaries: `/sa/foo` matches `/sa`,
/// `/saturn` does not.
fn matched_route<'a>(routes: &'a [ProxyRoute], path: &str) -> Option<&'a ProxyRoute> {
    routes.iter().find(|route| {
        path.strip_prefix(route.prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Fallback handler: any request no explicit route claimed is forwarded to
/// the matching upstream with that route's credential injected.
pub(super) async fn forward_to_upstream(
    State(state): State<AppState>,
    request: Request,
) -> Response {
    let path = request.uri().path().to_string();
    let Some(route) = matched_route(&state.proxy_routes, &path) else {
        warn!("no upstream route matches {path}");
        return ApiError::not_found(format!("no upstream route matches {path}")).into_response();
    };

    let method = match request.method() {
        &Method::GET => Method::GET,
        &Method::POST => Method::POST,
        &Method::PUT => Method::PUT,
        &Method::DELETE => Method::DELETE,
        &Method::PATCH => Method::PATCH,
        &Method::HEAD => Method::HEAD,
        &Method::OPTIONS => Method::OPTIONS,
        other => {
            warn!("method {other} not supported for proxied requests");
            return ApiError::new("method not supported", StatusCode::METHOD_NOT_ALLOWED)
                .into_response();
        }
    };

    let mut url = format!("{}{}", route.target, &path[route.prefix.len()..]);
    if let Some(query) = request.uri().query() {
        url.push('?');
        url.push_str(query);
    }

    let headers = request.headers().clone();
    let body = match to_bytes(request.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("failed to read request body: {err}");
            return ApiError::bad_request("failed to read request body").into_response();
        }
    };

    let mut upstream_request = state.proxy_client.request(method, url);
    for (name, value) in headers.iter() {
        // The host header belongs to the upstream connection, and the
        // credential header must come from the route table, never the client.
        if name == &HOST || name == &route.header_name {
            continue;
        }
        upstream_request = upstream_request.header(name.as_str(), value.clone());
    }
    upstream_request = upstream_request
        .header(route.header_name.as_str(), route.header_value.clone())
        .body(body);

    let upstream_response = match upstream_request.send().await {
        Ok(response) => response,
        Err(err) if err.is_timeout() => {
            error!("upstream request to {} timed out: {err}", route.prefix);
            return ApiError::bad_gateway("upstream request timed out").into_response();
        }
        Err(err) if err.is_connect() => {
            error!("failed to connect to upstream {}: {err}", route.prefix);
            return ApiError::bad_gateway("failed to connect to upstream").into_response();
        }
        Err(err) => {
            error!("upstream request to {} failed: {err}", route.prefix);
            return ApiError::bad_gateway(format!("upstream request failed: {err}"))
                .into_response();
        }
    };

    let status = upstream_response.status();
    let upstream_headers = upstream_response.headers().clone();
    let response_body = match upstream_response.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("failed to read upstream response body: {err}");
            return ApiError::bad_gateway("failed to read upstream response").into_response();
        }
    };

    let mut response = Response::new(Body::from(response_body));
    *response.status_mut() = status;
    for (name, value) in upstream_headers.iter() {
        response
            .headers_mut()
            .insert(name.clone(), value.clone());
    }
    response
}

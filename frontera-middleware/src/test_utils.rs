use crate::config::MiddlewareConfig;
use crate::create_app;
use crate::providers::UserProfile;
use crate::state::AppState;
use crate::token::{SessionClaims, SessionSigner};
use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::MockServer;

/// Test fixture wiring the full app against mock servers for every external
/// surface: the OAuth provider endpoints, customer-os, user-admin, and one
/// proxied upstream (settings). The file-storage upstream deliberately points
/// at a closed port for unreachable-upstream tests.
///
/// Requests go through `tower::ServiceExt::oneshot`, so the session
/// middleware and the proxy fallback are exercised exactly as in production.
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration the app was built with
    pub config: MiddlewareConfig,
    /// Mock server hosting the Google and Azure AD endpoints
    pub provider_mock: MockServer,
    /// Mock server for the customer-os GraphQL API
    pub customer_os_mock: MockServer,
    /// Mock server for the user-admin service (notification + `/ua` proxy)
    pub user_admin_mock: MockServer,
    /// Mock server for the settings service (`/sa` proxy)
    pub settings_mock: MockServer,
}

impl TestFixture {
    pub async fn new() -> Self {
        // Initialize test logger
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        // Create mock servers
        let provider_mock = MockServer::start().await;
        let customer_os_mock = MockServer::start().await;
        let user_admin_mock = MockServer::start().await;
        let settings_mock = MockServer::start().await;

        // Create settings configured with mocks
        let config = MiddlewareConfig::for_test_with_mocks(
            &provider_mock,
            &customer_os_mock,
            &user_admin_mock,
            &settings_mock,
        );

        // Create app state
        let state = AppState::for_testing(&config);
        let app = create_app(state).await;

        Self {
            app,
            config,
            provider_mock,
            customer_os_mock,
            user_admin_mock,
            settings_mock,
        }
    }

    /// Creates a request builder with a JSON content type and no
    /// authorization header; session handling is what is under test.
    pub fn request_builder(&self, method: &str, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
    }

    /// Sends an unauthenticated GET request.
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder("GET", uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a GET request with the given `Authorization` header value.
    pub async fn get_with_auth(
        &self,
        uri: impl AsRef<str>,
        authorization: &str,
    ) -> TestResponse {
        let request = self
            .request_builder("GET", uri)
            .header("Authorization", authorization)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }

    /// A plausible signed-in user for tests that need an existing session.
    pub fn sample_session(&self) -> SessionClaims {
        SessionClaims::new(
            "testco".to_string(),
            "provider-access-token".to_string(),
            Some("provider-refresh-token".to_string()),
            "test-integrations-token".to_string(),
            UserProfile {
                id: "1001".to_string(),
                email: "jane@testco.com".to_string(),
                name: "Jane Doe".to_string(),
                given_name: "Jane".to_string(),
                family_name: "Doe".to_string(),
                picture: String::new(),
                locale: "en".to_string(),
                verified_email: true,
            },
        )
    }

    /// Signs arbitrary claims with the fixture's session secret.
    pub fn sign_session(&self, claims: &SessionClaims) -> String {
        SessionSigner::new(&self.config.jwt_secret)
            .sign(claims)
            .expect("Failed to sign test session")
    }

    /// A valid bearer token for the sample session.
    pub fn session_token(&self) -> String {
        self.sign_session(&self.sample_session())
    }

    /// Waits for the detached sign-in notification to land on the user-admin
    /// mock and returns its JSON body. The notification races the response,
    /// so this polls briefly instead of assuming ordering.
    pub async fn wait_for_signin_request(&self) -> Value {
        for _ in 0..50 {
            let requests = self
                .user_admin_mock
                .received_requests()
                .await
                .unwrap_or_default();
            if let Some(request) = requests
                .iter()
                .find(|request| request.url.path() == "/signin")
            {
                return serde_json::from_slice(&request.body)
                    .expect("sign-in notification body is JSON");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("no sign-in notification arrived within the polling window");
    }
}

/// Response from a test request with convenient access to status, headers
/// and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers (redirect tests need `Location`)
    pub headers: HeaderMap,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// The `Location` header of a redirect response.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or not valid UTF-8.
    pub fn location(&self) -> String {
        self.headers
            .get(http::header::LOCATION)
            .expect("response has no Location header")
            .to_str()
            .expect("Location header is valid UTF-8")
            .to_string()
    }
}

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::api::proxy::{self, ProxyRoute};
use crate::config::MiddlewareConfig;
use crate::customer_os::{CustomerOsClient, UserAdminClient};
use crate::issuer::SessionIssuer;
use crate::providers::{GoogleProvider, MicrosoftProvider};
use crate::token::{IntegrationTokenSigner, SessionSigner, TokenError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state shared between all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MiddlewareConfig>,
    pub google: Arc<GoogleProvider>,
    pub azure_ad: Arc<MicrosoftProvider>,
    pub issuer: Arc<SessionIssuer>,
    pub session_signer: Arc<SessionSigner>,
    pub proxy_client: Client,
    pub proxy_routes: Arc<Vec<ProxyRoute>>,
}

impl AppState {
    pub fn new(config: &MiddlewareConfig) -> Result<Self, TokenError> {
        let oauth_client = create_client(config.oauth_client_timeout);
        let proxy_client = create_client(config.proxy_client_timeout);

        let google = GoogleProvider::new(
            config.google.clone(),
            config.callback_url("/callback/google-auth"),
            oauth_client.clone(),
        );
        let azure_ad = MicrosoftProvider::new(
            config.azure_ad.clone(),
            config.callback_url("/callback/azure-ad-auth"),
            oauth_client.clone(),
        );

        let integration_signer = IntegrationTokenSigner::new(
            &config.integration_app.workspace_key,
            &config.integration_app.private_key,
        )?;
        let customer_os = CustomerOsClient::new(
            oauth_client.clone(),
            config.upstreams.customer_os_url.clone(),
            config.upstreams.customer_os_api_key.clone(),
        );
        let user_admin = UserAdminClient::new(
            oauth_client,
            config.upstreams.user_admin_url.clone(),
            config.upstreams.user_admin_api_key.clone(),
        );
        let issuer = SessionIssuer::new(
            customer_os,
            user_admin,
            SessionSigner::new(&config.jwt_secret),
            integration_signer,
        );

        Ok(Self {
            config: Arc::new(config.clone()),
            google: Arc::new(google),
            azure_ad: Arc::new(azure_ad),
            issuer: Arc::new(issuer),
            session_signer: Arc::new(SessionSigner::new(&config.jwt_secret)),
            proxy_client,
            proxy_routes: Arc::new(proxy::routes_for(config)),
        })
    }

    #[cfg(test)]
    pub fn for_testing(config: &MiddlewareConfig) -> Self {
        Self::new(config).expect("failed to build test state")
    }
}

fn create_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to create HTTP client")
}

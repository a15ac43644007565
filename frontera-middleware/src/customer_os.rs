use http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::providers::Provider;

/// Per-route service credential header.
pub const API_KEY_HEADER: &str = "X-Openline-API-KEY";
/// Identity header for tenant resolution.
pub const USERNAME_HEADER: &str = "X-Openline-USERNAME";
/// Credential header used by the comms upstream instead of the standard one.
pub const MAIL_API_KEY_HEADER: &str = "X-Openline-Mail-Api-Key";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("request failed with status: {0}")]
    InvalidStatus(StatusCode),
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct TenantResponse {
    #[serde(default)]
    data: Option<TenantData>,
}

#[derive(Debug, Deserialize)]
struct TenantData {
    #[serde(default)]
    tenant: Option<String>,
}

/// Client for the customer-os GraphQL API.
#[derive(Clone)]
pub struct CustomerOsClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl CustomerOsClient {
    pub fn new(http_client: Client, base_url: String, api_key: String) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
        }
    }

    /// Resolve the tenant of `email`. A user without a tenant resolves to an
    /// empty string; only transport or status failures are errors.
    pub async fn fetch_tenant(&self, email: &str) -> Result<String, BackendError> {
        let body = json!({
            "operationName": "tenant",
            "query": "query tenant { tenant }",
        });
        let response = self
            .http_client
            .post(format!("{}/query", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header(USERNAME_HEADER, email)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BackendError::InvalidStatus(response.status()));
        }
        let bytes = response.bytes().await?;
        let payload: TenantResponse = serde_json::from_slice(&bytes)?;
        Ok(payload
            .data
            .and_then(|data| data.tenant)
            .unwrap_or_default())
    }
}

/// Sign-in event sent to the user-admin service. Field names are the wire
/// contract of its `/signin` endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInNotification {
    pub provider: Provider,
    pub tenant: String,
    pub logged_in_email: String,
    /// Email the OAuth tokens actually belong to (the authenticated profile)
    pub o_auth_token_for_email: String,
    pub o_auth_token_type: String,
    pub o_auth_token: OAuthTokenPayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthTokenPayload {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub provider_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// Client for the user-admin service.
#[derive(Clone)]
pub struct UserAdminClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl UserAdminClient {
    pub fn new(http_client: Client, base_url: String, api_key: String) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
        }
    }

    pub async fn notify_sign_in(
        &self,
        notification: &SignInNotification,
    ) -> Result<(), BackendError> {
        let response = self
            .http_client
            .post(format!("{}/signin", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(notification)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BackendError::InvalidStatus(response.status()));
        }
        Ok(())
    }
}

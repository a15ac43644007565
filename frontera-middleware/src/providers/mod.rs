mod google;
mod microsoft;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use google::GoogleProvider;
pub use microsoft::MicrosoftProvider;

use crate::token::OAuthState;

/// Identity providers a login can come from. Serialized form matches the
/// route segments (`google`, `azure-ad`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    Google,
    AzureAd,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::AzureAd => "azure-ad",
        }
    }
}

/// Normalized user profile, shaped after Google's userinfo v2 response.
/// The Microsoft adapter synthesizes the same shape from a Graph profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub verified_email: bool,
}

/// Token endpoint response, common to both providers.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("token exchange failed with status {status}: {detail}")]
    TokenExchangeFailed { status: u16, detail: String },
    #[error("profile fetch failed with status {status}: {detail}")]
    ProfileFetchFailed { status: u16, detail: String },
    #[error("request to provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid authorization URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// One OAuth provider: build the browser redirect, trade the code for tokens,
/// fetch the profile. Single attempt each, no retries.
#[async_trait]
pub trait OAuthAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Authorization URL the browser is sent to. `prompt_consent` is set by
    /// the enable-sync flows to force re-consent for the added scopes.
    fn authorization_url(
        &self,
        scopes: &[&str],
        state: &OAuthState,
        prompt_consent: bool,
    ) -> Result<String, ProviderError>;

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, ProviderError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, ProviderError>;
}

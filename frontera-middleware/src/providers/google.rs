use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{OAuthAdapter, OAuthTokens, Provider, ProviderError, UserProfile};
use crate::config::GoogleConfig;
use crate::token::OAuthState;

pub struct GoogleProvider {
    config: GoogleConfig,
    redirect_uri: String,
    http_client: Client,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig, redirect_uri: String, http_client: Client) -> Self {
        Self {
            config,
            redirect_uri,
            http_client,
        }
    }
}

#[async_trait]
impl OAuthAdapter for GoogleProvider {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn authorization_url(
        &self,
        scopes: &[&str],
        state: &OAuthState,
        prompt_consent: bool,
    ) -> Result<String, ProviderError> {
        let mut url = Url::parse(&self.config.auth_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &scopes.join(" "))
            // offline access so a refresh token comes back with the code
            .append_pair("access_type", "offline")
            .append_pair("state", &state.encode());
        if prompt_consent {
            url.query_pairs_mut().append_pair("prompt", "consent");
        }
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, ProviderError> {
        let params = [
            ("code", code),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
            ("redirect_uri", &self.redirect_uri),
            ("grant_type", "authorization_code"),
        ];
        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::TokenExchangeFailed {
                status: response.status().as_u16(),
                detail: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, ProviderError> {
        let response = self
            .http_client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::ProfileFetchFailed {
                status: response.status().as_u16(),
                detail: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }
}

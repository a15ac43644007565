use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{OAuthAdapter, OAuthTokens, Provider, ProviderError, UserProfile};
use crate::config::AzureAdConfig;
use crate::token::OAuthState;

/// Scopes sent with the token exchange request; Azure requires them there too.
const TOKEN_EXCHANGE_SCOPES: &str = "openid profile email";

pub struct MicrosoftProvider {
    config: AzureAdConfig,
    redirect_uri: String,
    http_client: Client,
}

impl MicrosoftProvider {
    pub fn new(config: AzureAdConfig, redirect_uri: String, http_client: Client) -> Self {
        Self {
            config,
            redirect_uri,
            http_client,
        }
    }
}

/// `GET {graph}/me` response, reduced to what the profile needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphProfile {
    #[serde(default)]
    id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    given_name: String,
    #[serde(default)]
    user_principal_name: String,
}

#[async_trait]
impl OAuthAdapter for MicrosoftProvider {
    fn provider(&self) -> Provider {
        Provider::AzureAd
    }

    fn authorization_url(
        &self,
        scopes: &[&str],
        state: &OAuthState,
        _prompt_consent: bool,
    ) -> Result<String, ProviderError> {
        let mut url = Url::parse(&self.config.auth_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &scopes.join(" "))
            .append_pair("sso_reload", "true")
            // Azure logins always force the consent prompt
            .append_pair("prompt", "consent")
            .append_pair("state", &state.encode());
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, ProviderError> {
        let params = [
            ("code", code),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
            ("redirect_uri", &self.redirect_uri),
            ("grant_type", "authorization_code"),
            ("scope", TOKEN_EXCHANGE_SCOPES),
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
            .get(format!("{}/me", self.config.graph_url))
            .bearer_auth(access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::ProfileFetchFailed {
                status: response.status().as_u16(),
                detail: response.text().await.unwrap_or_default(),
            });
        }
        let graph: GraphProfile = response.json().await?;
        Ok(UserProfile {
            id: graph.id,
            email: graph.user_principal_name,
            name: graph.display_name,
            given_name: graph.given_name,
            family_name: String::new(),
            picture: String::new(),
            locale: String::new(),
            verified_email: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_with(config: AzureAdConfig) -> MicrosoftProvider {
        MicrosoftProvider::new(
            config,
            "https://middleware.example.test/callback/azure-ad-auth".to_string(),
            Client::new(),
        )
    }

    fn test_config() -> AzureAdConfig {
        AzureAdConfig {
            client_id: "azure-client-id".to_string(),
            client_secret: "azure-client-secret".to_string(),
            auth_url: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize".to_string(),
            token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token".to_string(),
            graph_url: "https://graph.microsoft.com/v1.0".to_string(),
        }
    }

    fn query_map(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_login_url_always_forces_consent_and_sso_reload() {
        let provider = provider_with(test_config());
        let url = provider
            .authorization_url(
                &["email", "openid", "profile", "User.Read"],
                &OAuthState::login("/finder"),
                false,
            )
            .unwrap();

        let params = query_map(&url);
        assert_eq!(params["client_id"], "azure-client-id");
        assert_eq!(params["prompt"], "consent");
        assert_eq!(params["sso_reload"], "true");
        assert_eq!(params["scope"], "email openid profile User.Read");

        let state = OAuthState::decode(&params["state"]).unwrap();
        assert_eq!(state.origin, "/finder");
    }

    #[tokio::test]
    async fn test_exchange_code_includes_scope_param() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("scope=openid+profile+email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ms-access",
                "id_token": "ms-id-token",
                "scope": "openid profile email",
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = provider_with(AzureAdConfig {
            token_url: format!("{}/token", mock_server.uri()),
            ..test_config()
        });
        let tokens = provider.exchange_code("auth-code").await.unwrap();
        assert_eq!(tokens.access_token, "ms-access");
        assert_eq!(tokens.refresh_token, None);
    }

    #[tokio::test]
    async fn test_fetch_profile_synthesizes_userinfo_shape() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("authorization", "Bearer ms-access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "ms-user-1",
                "displayName": "Jane Doe",
                "givenName": "Jane",
                "userPrincipalName": "jane@acme.onmicrosoft.com",
                "mail": "jane@acme.com",
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = provider_with(AzureAdConfig {
            graph_url: mock_server.uri(),
            ..test_config()
        });
        let profile = provider.fetch_profile("ms-access").await.unwrap();
        assert_eq!(profile.id, "ms-user-1");
        assert_eq!(profile.email, "jane@acme.onmicrosoft.com");
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.given_name, "Jane");
        assert_eq!(profile.picture, "");
        assert_eq!(profile.locale, "");
        assert!(!profile.verified_email);
    }

    #[tokio::test]
    async fn test_fetch_profile_maps_graph_rejection() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(401).set_body_string("InvalidAuthenticationToken"))
            .mount(&mock_server)
            .await;

        let provider = provider_with(AzureAdConfig {
            graph_url: mock_server.uri(),
            ..test_config()
        });
        let err = provider.fetch_profile("stale").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::ProfileFetchFailed { status: 401, .. }
        ));
    }
}

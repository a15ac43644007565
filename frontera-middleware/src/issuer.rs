use chrono::{Duration, Utc};
use log::{debug, error};
use thiserror::Error;

use crate::customer_os::{
    BackendError, CustomerOsClient, OAuthTokenPayload, SignInNotification, UserAdminClient,
};
use crate::providers::{OAuthTokens, Provider, UserProfile};
use crate::token::{IntegrationTokenSigner, OAuthState, SessionClaims, SessionSigner, TokenError};

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("tenant resolution failed: {0}")]
    TenantResolution(#[source] BackendError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// What a successful login produces: the signed session token and the
/// client-app path to land on.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session_token: String,
    pub origin: String,
}

/// Turns exchanged OAuth tokens plus a profile into a signed session.
pub struct SessionIssuer {
    customer_os: CustomerOsClient,
    user_admin: UserAdminClient,
    session_signer: SessionSigner,
    integration_signer: IntegrationTokenSigner,
}

impl SessionIssuer {
    pub fn new(
        customer_os: CustomerOsClient,
        user_admin: UserAdminClient,
        session_signer: SessionSigner,
        integration_signer: IntegrationTokenSigner,
    ) -> Self {
        Self {
            customer_os,
            user_admin,
            session_signer,
            integration_signer,
        }
    }

    pub async fn issue(
        &self,
        provider: Provider,
        tokens: OAuthTokens,
        mut profile: UserProfile,
        state: OAuthState,
    ) -> Result<IssuedSession, IssueError> {
        // An enable-sync flow carries the signed-in user's email in the
        // state; it wins over the freshly authenticated profile's email.
        let logged_in_email = state
            .email
            .clone()
            .unwrap_or_else(|| profile.email.clone());

        self.spawn_sign_in_notification(provider, &tokens, &profile, &state, &logged_in_email);

        let tenant = self
            .customer_os
            .fetch_tenant(&logged_in_email)
            .await
            .map_err(IssueError::TenantResolution)?;
        debug!("resolved tenant '{tenant}' for {logged_in_email}");

        let integrations_token = self.integration_signer.sign(&tenant)?;

        // The Graph principal name may differ from the address the user is
        // known by; the session profile carries the latter.
        if provider == Provider::AzureAd {
            profile.email = logged_in_email;
        }

        let claims = SessionClaims::new(
            tenant,
            tokens.access_token,
            tokens.refresh_token,
            integrations_token,
            profile,
        );
        let session_token = self.session_signer.sign(&claims)?;

        Ok(IssuedSession {
            session_token,
            origin: state.origin,
        })
    }

    /// Best effort: the login proceeds whether or not user-admin accepts the
    /// notification, so it runs as a detached task and only logs failures.
    fn spawn_sign_in_notification(
        &self,
        provider: Provider,
        tokens: &OAuthTokens,
        profile: &UserProfile,
        state: &OAuthState,
        logged_in_email: &str,
    ) {
        let expires_at = match provider {
            Provider::Google => Some(
                tokens
                    .expires_in
                    .map(|seconds| Utc::now() + Duration::seconds(seconds as i64))
                    .unwrap_or_else(Utc::now)
                    .to_rfc3339(),
            ),
            Provider::AzureAd => None,
        };
        let notification = SignInNotification {
            provider,
            tenant: state.tenant.clone().unwrap_or_default(),
            logged_in_email: logged_in_email.to_string(),
            o_auth_token_for_email: profile.email.clone(),
            o_auth_token_type: state.kind.clone().unwrap_or_default(),
            o_auth_token: OAuthTokenPayload {
                access_token: tokens.access_token.clone(),
                refresh_token: tokens.refresh_token.clone(),
                expires_at,
                scope: tokens.scope.clone(),
                provider_account_id: profile.id.clone(),
                id_token: tokens.id_token.clone(),
            },
        };
        let user_admin = self.user_admin.clone();
        tokio::spawn(async move {
            if let Err(err) = user_admin.notify_sign_in(&notification).await {
                error!("sign-in notification failed: {err}");
            }
        });
    }
}

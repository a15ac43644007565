use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::UserProfile;

/// Both the session token and the integration token live this long.
pub const TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("malformed state parameter: {0}")]
    MalformedState(String),
}

impl From<base64::DecodeError> for TokenError {
    fn from(err: base64::DecodeError) -> Self {
        TokenError::MalformedState(err.to_string())
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(err: serde_json::Error) -> Self {
        TokenError::MalformedState(err.to_string())
    }
}

/// Request context threaded through the OAuth redirect as the opaque `state`
/// parameter: base64 of compact JSON. Carried context, not a CSRF nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    /// Client-app path to land on after a successful login
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Sync flavor requested by the enable-sync flows, echoed back to user-admin
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub kind: Option<String>,
    /// Email of the already signed-in user, takes precedence over the
    /// freshly authenticated profile's email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl OAuthState {
    pub fn login(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            tenant: None,
            kind: None,
            email: None,
        }
    }

    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).expect("state serializes to JSON");
        BASE64.encode(json)
    }

    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let bytes = BASE64.decode(raw)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Claims of the session token handed to the browser client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub tenant: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub integrations_token: String,
    pub profile: UserProfile,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(
        tenant: String,
        access_token: String,
        refresh_token: Option<String>,
        integrations_token: String,
        profile: UserProfile,
    ) -> Self {
        Self {
            tenant,
            access_token,
            refresh_token,
            integrations_token,
            profile,
            exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        }
    }
}

/// HS256 signer/verifier for session tokens.
#[derive(Clone)]
pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(err.to_string()),
            })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct IntegrationClaims {
    id: String,
    name: String,
    iss: String,
    exp: i64,
}

/// ES256 signer for workspace-scoped integration tokens.
#[derive(Clone)]
pub struct IntegrationTokenSigner {
    workspace_key: String,
    encoding_key: EncodingKey,
}

impl IntegrationTokenSigner {
    pub fn new(workspace_key: &str, private_key_pem: &str) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_ec_pem(private_key_pem.as_bytes())
            .map_err(|err| TokenError::Signing(format!("invalid EC private key: {err}")))?;
        Ok(Self {
            workspace_key: workspace_key.to_string(),
            encoding_key,
        })
    }

    /// Both `id` and `name` carry the tenant; the workspace key is the issuer.
    pub fn sign(&self, tenant: &str) -> Result<String, TokenError> {
        let claims = IntegrationClaims {
            id: tenant.to_string(),
            name: tenant.to_string(),
            iss: self.workspace_key.clone(),
            exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        encode(&Header::new(Algorithm::ES256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }
}

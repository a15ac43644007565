use confique::Config;

/// Google OAuth application settings. Endpoint URLs are overridable so tests
/// can point the adapter at a mock server.
#[derive(Debug, Config, Clone)]
pub struct GoogleConfig {
    #[config(env = "FRONTERA_GOOGLE_CLIENT_ID")]
    pub client_id: String,

    #[config(env = "FRONTERA_GOOGLE_CLIENT_SECRET")]
    pub client_secret: String,

    #[config(
        env = "FRONTERA_GOOGLE_AUTH_URL",
        default = "https://accounts.google.com/o/oauth2/v2/auth"
    )]
    pub auth_url: String,

    #[config(
        env = "FRONTERA_GOOGLE_TOKEN_URL",
        default = "https://oauth2.googleapis.com/token"
    )]
    pub token_url: String,

    #[config(
        env = "FRONTERA_GOOGLE_USERINFO_URL",
        default = "https://www.googleapis.com/oauth2/v2/userinfo"
    )]
    pub userinfo_url: String,
}

/// Azure AD (Microsoft identity platform) application settings.
#[derive(Debug, Config, Clone)]
pub struct AzureAdConfig {
    #[config(env = "FRONTERA_AZURE_AD_CLIENT_ID")]
    pub client_id: String,

    #[config(env = "FRONTERA_AZURE_AD_CLIENT_SECRET")]
    pub client_secret: String,

    #[config(
        env = "FRONTERA_AZURE_AD_AUTH_URL",
        default = "https://login.microsoftonline.com/common/oauth2/v2.0/authorize"
    )]
    pub auth_url: String,

    #[config(
        env = "FRONTERA_AZURE_AD_TOKEN_URL",
        default = "https://login.microsoftonline.com/common/oauth2/v2.0/token"
    )]
    pub token_url: String,

    /// Microsoft Graph base URL, profile is fetched from `{graph_url}/me`
    #[config(
        env = "FRONTERA_AZURE_AD_GRAPH_URL",
        default = "https://graph.microsoft.com/v1.0"
    )]
    pub graph_url: String,
}

/// Integration platform settings for minting workspace-scoped tokens.
#[derive(Debug, Config, Clone)]
pub struct IntegrationAppConfig {
    /// Workspace key, used as the `iss` claim of integration tokens
    #[config(env = "FRONTERA_INTEGRATION_APP_WORKSPACE_KEY")]
    pub workspace_key: String,

    /// ES256 private key in PEM form
    #[config(env = "FRONTERA_INTEGRATION_APP_PRIVATE_KEY")]
    pub private_key: String,
}

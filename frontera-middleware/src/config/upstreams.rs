use confique::Config;

/// Base URLs and API keys for the internal services the proxy injects
/// credentials for. The customer-os entry serves both the `/query` and
/// `/stream` surfaces.
#[derive(Debug, Config, Clone)]
pub struct UpstreamsConfig {
    #[config(env = "FRONTERA_CUSTOMER_OS_API_URL")]
    pub customer_os_url: String,

    #[config(env = "FRONTERA_CUSTOMER_OS_API_KEY")]
    pub customer_os_api_key: String,

    #[config(env = "FRONTERA_SETTINGS_API_URL")]
    pub settings_url: String,

    #[config(env = "FRONTERA_SETTINGS_API_KEY")]
    pub settings_api_key: String,

    #[config(env = "FRONTERA_USER_ADMIN_API_URL")]
    pub user_admin_url: String,

    #[config(env = "FRONTERA_USER_ADMIN_API_KEY")]
    pub user_admin_api_key: String,

    #[config(env = "FRONTERA_FILE_STORAGE_API_URL")]
    pub file_storage_url: String,

    #[config(env = "FRONTERA_FILE_STORAGE_API_KEY")]
    pub file_storage_api_key: String,

    #[config(env = "FRONTERA_COMMS_API_URL")]
    pub comms_url: String,

    /// Sent as `X-Openline-Mail-Api-Key` instead of the standard API key header
    #[config(env = "FRONTERA_COMMS_MAIL_API_KEY")]
    pub comms_mail_api_key: String,
}

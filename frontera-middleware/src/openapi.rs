use utoipa::OpenApi;

pub(crate) const AUTH_TAG: &str = "Authentication API";
pub(crate) const HEALTH_TAG: &str = "Health API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = AUTH_TAG, description = "Login entry points, provider callbacks and session inspection"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    ),
    info(
        title = "Frontera Middleware API",
        description = "OAuth login, session minting and credential-injecting reverse proxy for the CustomerOS client app",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;

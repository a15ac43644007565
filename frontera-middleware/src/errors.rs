use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a message and status code
    pub fn new<S: ToString>(message: S, status_code: StatusCode) -> Self {
        Self {
            message: message.to_string(),
            status_code,
        }
    }

    /// Create new Internal Server Error (500) with a message
    pub fn internal<S: ToString>(message: S) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create new Bad Request Error (400) with a message
    pub fn bad_request<S: ToString>(message: S) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    /// Create new Unauthorized Error (401) with a message
    pub fn unauthorized<S: ToString>(message: S) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED)
    }

    /// Create new Not Found Error (404) with a message
    pub fn not_found<S: ToString>(message: S) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    /// Create new Bad Gateway (502) with a message
    pub fn bad_gateway<S: ToString>(message: S) -> Self {
        Self::new(message, StatusCode::BAD_GATEWAY)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let body = json!({
            "message": self.message,
        });
        (status_code, Json(body)).into_response()
    }
}

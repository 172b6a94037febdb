use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// PortalError
///
/// The single error type of the crate. Library operations return it and the HTTP
/// layer converts it into a JSON error response.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The validation service rejected the bearer token (HTTP 401).
    #[error("session token rejected")]
    Unauthorized,

    #[error("validation service answered with status {0}")]
    Upstream(u16),

    /// The validation service answered 2xx but reported `success: false`.
    #[error("validation service reported an invalid session")]
    ValidationFailed,
}

impl PortalError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Unauthorized | PortalError::ValidationFailed => StatusCode::UNAUTHORIZED,
            PortalError::Http(_) | PortalError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": message
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(AuthError::AccessDenied) => StatusCode::FORBIDDEN,
            AppError::ConfigError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid API token")]
    AccessDenied,
}

/// Failures local to a single peer or message. These never leave the relay
/// core: the dispatcher logs and drops them.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Peer {0} is no longer connected")]
    PeerGone(uuid::Uuid),

    #[error("Outbound queue for peer {0} is full")]
    QueueFull(uuid::Uuid),

    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

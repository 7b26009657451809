use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use postvak_shared::error::AuthError;
use postvak_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Authentication failures pass through unwrapped; they are never folded
    /// into a response envelope.
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServerError::NotFound("Record not found".to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Auth(AuthError::CredentialExpired)
            | ServerError::Auth(AuthError::CredentialNotFound)
            | ServerError::Auth(AuthError::UnknownUser) => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ServerError::Auth(AuthError::UnauthorizedForResource(_)) => {
                (StatusCode::FORBIDDEN, self.to_string())
            }
            ServerError::Auth(AuthError::Backend(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

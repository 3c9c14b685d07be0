//! Error types for the Salesboard server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// IO error.
    #[error("IO error: {message}")]
    Io { message: String },

    /// Loading or pipeline error.
    #[error("{0}")]
    Core(#[from] salesboard_core::Error),

    /// No session with this id.
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// The upload loaded but no row had a valid order date.
    #[error("No rows with a valid order date")]
    EmptyDataset,

    /// Invalid bind address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(String),
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Core(salesboard_core::Error::UnknownTable(_)) => StatusCode::NOT_FOUND,
            ServerError::Core(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::EmptyDataset | ServerError::Json(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let missing = ServerError::Core(salesboard_core::Error::MissingColumn("Region".into()));
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.to_string(), "missing required column: Region");

        let table = ServerError::Core(salesboard_core::Error::UnknownTable("x".into()));
        assert_eq!(table.status(), StatusCode::NOT_FOUND);

        assert_eq!(
            ServerError::SessionNotFound(Uuid::nil()).status(),
            StatusCode::NOT_FOUND
        );

        let io = ServerError::Core(salesboard_core::Error::Io(std::io::Error::other("disk")));
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! RPC error types and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use runoff_election::{ElectionError, ErrorCategory};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("missing x-identity header")]
    MissingIdentity,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Election(#[from] ElectionError),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingIdentity => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Election(err) => match err.category() {
                ErrorCategory::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorCategory::NotFound => StatusCode::NOT_FOUND,
                ErrorCategory::NotActive
                | ErrorCategory::AlreadyDone
                | ErrorCategory::StillActive
                | ErrorCategory::NotFinalized => StatusCode::CONFLICT,
                ErrorCategory::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCategory::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingIdentity => ErrorCategory::Unauthorized.as_str(),
            Self::InvalidRequest(_) => "invalid_request",
            Self::Election(err) => err.category().as_str(),
            Self::Server(_) => "server",
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = json!({ "error": self.code(), "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runoff_types::{ElectionId, Timestamp};

    #[test]
    fn lifecycle_conflicts_are_409() {
        let err = RpcError::from(ElectionError::StillActive {
            election: ElectionId::new(1),
            ends_at: Timestamp::new(9),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "still_active");
    }

    #[test]
    fn unknown_records_are_404() {
        let err = RpcError::from(ElectionError::NotFound(ElectionId::new(1)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}

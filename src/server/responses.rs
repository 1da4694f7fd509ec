use crate::error::CompanionError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
        .into_response()
}

impl CompanionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CompanionError::Unauthorized => StatusCode::UNAUTHORIZED,
            CompanionError::Forbidden(_) => StatusCode::FORBIDDEN,
            CompanionError::NotFound(_) => StatusCode::NOT_FOUND,
            CompanionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CompanionError::Conflict(_) => StatusCode::CONFLICT,
            CompanionError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CompanionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            CompanionError::OperationFailed(err) => {
                error!("Operation failed: {:#}", err);
                "Operation failed".to_string()
            }
            CompanionError::Unauthorized => "Unauthorized".to_string(),
            CompanionError::Forbidden(msg)
            | CompanionError::NotFound(msg)
            | CompanionError::InvalidInput(msg)
            | CompanionError::Conflict(msg) => msg.clone(),
        };
        error_response(status, message)
    }
}

/// Proxied catalog calls that fail upstream.
pub fn bad_gateway(err: anyhow::Error) -> Response {
    error!("Catalog request failed: {:#}", err);
    error_response(StatusCode::BAD_GATEWAY, "Catalog unavailable")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_statuses() {
        let cases = vec![
            (CompanionError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                CompanionError::Forbidden("no".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                CompanionError::NotFound("playlist x".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                CompanionError::InvalidInput("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CompanionError::Conflict("taken".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                CompanionError::OperationFailed(anyhow::anyhow!("db")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}

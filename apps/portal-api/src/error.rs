//! API error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sow_crm::CrmError;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Crm(#[from] CrmError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m),
            Self::Conflict(m) => (StatusCode::CONFLICT, m),
            // CRM internals (tokens, property names, remote messages) are
            // logged but never forwarded to the caller.
            Self::Crm(CrmError::NotFound(detail)) => {
                error!(%detail, "CRM record not found");
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            Self::Crm(e) => {
                error!(error = %e, "CRM request failed");
                (StatusCode::BAD_GATEWAY, "CRM request failed".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crm_errors_are_not_leaked() {
        let response = ApiError::Crm(CrmError::Auth("token pat-secret rejected".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn client_errors_map_to_their_status() {
        let cases = [
            (
                ApiError::BadRequest("missing token".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Unauthorized("invalid PIN".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::NotFound("SOW not found".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Conflict("SOW already approved".to_string()),
                StatusCode::CONFLICT,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}

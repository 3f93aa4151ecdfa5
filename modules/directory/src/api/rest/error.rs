//! Domain → HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use orggate_rebac::EngineError;

use crate::domain::error::DomainError;

/// Body shape for every non-2xx response on this surface.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// REST-facing wrapper over `DomainError`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            DomainError::UnknownLevel { .. } => (StatusCode::BAD_REQUEST, "unknown_level"),
            DomainError::LevelMismatch { .. } => (StatusCode::BAD_REQUEST, "level_mismatch"),
            DomainError::InvalidRole { .. } => (StatusCode::BAD_REQUEST, "invalid_role"),
            DomainError::NotPermitted { .. } => (StatusCode::FORBIDDEN, "not_permitted"),
            DomainError::SlugConflict { .. } => (StatusCode::CONFLICT, "slug_conflict"),
            DomainError::AlreadyMember { .. } => (StatusCode::CONFLICT, "already_member"),
            DomainError::ParentNotFound { .. } => (StatusCode::NOT_FOUND, "parent_not_found"),
            DomainError::ContainerNotFound { .. } => {
                (StatusCode::NOT_FOUND, "container_not_found")
            }
            DomainError::MembershipNotFound { .. } => {
                (StatusCode::NOT_FOUND, "membership_not_found")
            }
            DomainError::Engine(EngineError::Unavailable(_) | EngineError::Protocol(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "engine_unavailable")
            }
            DomainError::Database(_) | DomainError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "directory request failed");
        }

        let message = match status {
            // Internal detail stays out of 5xx bodies.
            StatusCode::INTERNAL_SERVER_ERROR => "internal error".to_owned(),
            _ => self.0.to_string(),
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

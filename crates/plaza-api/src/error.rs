//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use plaza_core::error::TownError;
use serde::Serialize;
use thiserror::Error;

/// Startup errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `TownError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub TownError);

impl From<TownError> for ApiError {
    fn from(err: TownError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            TownError::DuplicateZoneLabel(_) => (StatusCode::CONFLICT, "duplicate_zone_label"),
            TownError::OverlappingZone { .. } => (StatusCode::CONFLICT, "overlapping_zone"),
            TownError::EmptyTopic => (StatusCode::BAD_REQUEST, "empty_topic"),
            TownError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            TownError::GroupNotFound(_) => (StatusCode::NOT_FOUND, "group_not_found"),
            TownError::ZoneNotFound(_) => (StatusCode::NOT_FOUND, "zone_not_found"),
            TownError::ParticipantNotFound(_) => (StatusCode::NOT_FOUND, "participant_not_found"),
            TownError::TownNotFound(_) => (StatusCode::NOT_FOUND, "town_not_found"),
            TownError::SessionNotFound => (StatusCode::UNAUTHORIZED, "session_not_found"),
            TownError::InvalidUpdatePassword => {
                (StatusCode::FORBIDDEN, "invalid_update_password")
            }
            TownError::CredentialProvisioning(_) => {
                (StatusCode::BAD_GATEWAY, "credential_provisioning_failed")
            }
            TownError::NotAnOccupant { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invariant_violation")
            }
            TownError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn status_of(err: TownError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_zone_conflicts_map_to_409() {
        assert_eq!(
            status_of(TownError::DuplicateZoneLabel("nook".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(TownError::OverlappingZone {
                label: "hall".into(),
                existing: "nook".into(),
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_rejected_input_maps_to_400() {
        assert_eq!(status_of(TownError::EmptyTopic), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(TownError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_missing_entities_map_to_404() {
        assert_eq!(
            status_of(TownError::GroupNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(TownError::TownNotFound("ABCD1234".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_unknown_session_maps_to_401() {
        assert_eq!(status_of(TownError::SessionNotFound), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_wrong_password_maps_to_403() {
        assert_eq!(
            status_of(TownError::InvalidUpdatePassword),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_provider_failure_maps_to_502() {
        assert_eq!(
            status_of(TownError::CredentialProvisioning("timeout".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        assert_eq!(
            status_of(TownError::Infrastructure("lock poisoned".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

//! Maps core errors onto HTTP responses.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl Error {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::BelowMinimum { .. }
            | Self::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Unauthorized { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AlreadyReviewed { .. }
            | Self::AlreadyProcessed { .. }
            | Self::AlreadyExists { .. }
            | Self::DuplicateSubmission { .. }
            | Self::TaskNotActive { .. }
            | Self::TaskFull { .. } => StatusCode::CONFLICT,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!("Request failed: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::validation("bad"), StatusCode::BAD_REQUEST),
            (
                Error::BelowMinimum {
                    amount: 1,
                    minimum: 1_000,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::InsufficientBalance {
                    current: 0,
                    required: 1,
                },
                StatusCode::BAD_REQUEST,
            ),
            (Error::Unauthenticated, StatusCode::UNAUTHORIZED),
            (Error::unauthorized("no"), StatusCode::FORBIDDEN),
            (
                Error::NotFound {
                    entity: "Task",
                    id: 1,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                Error::AlreadyReviewed {
                    submission_id: 1,
                    status: "approved".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                Error::AlreadyExists {
                    entity: "User",
                    field: "username",
                    value: "alice".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                Error::TaskFull {
                    task_id: 1,
                    quantity: 1,
                },
                StatusCode::CONFLICT,
            ),
            (
                Error::Database(sea_orm::DbErr::Custom("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{error}");
        }
    }
}

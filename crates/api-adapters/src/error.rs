//! Maps the domain error taxonomy onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use domains::AppError;
use serde::Serialize;
use tracing::error;

/// Wire shape for error bodies. `field` is present only when the error
/// can be pinned to a single input field.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl ErrorBody {
    fn bare(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }
}

/// Newtype so the domain error can carry an `IntoResponse` impl.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody::bare("authentication required")),
            )
                .into_response(),
            // Deliberately bodyless. A 403 explains itself.
            AppError::Forbidden => StatusCode::FORBIDDEN.into_response(),
            AppError::Validation { message, field } | AppError::Conflict { message, field } => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { message, field })).into_response()
            }
            AppError::NotFound(entity, id) => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody::bare(format!("{entity} not found with id {id}"))),
            )
                .into_response(),
            AppError::Internal(detail) => {
                // The detail stays here; the body must not leak it.
                error!(%detail, "internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::bare("internal server error")),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

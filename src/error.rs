use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, upstream::UpstreamError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Catalog backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Running without a catalog backend.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Missing or malformed credentials on the request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The refresh token was refused; the client must sign in again.
    #[error("Session Expired")]
    SessionExpired,
    /// NPSSO or OAuth exchange failed.
    #[error("Authentication Failed")]
    AuthenticationFailed(#[source] UpstreamError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// An upstream call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Plain 401 whose message is shown verbatim.
    #[error("{0}")]
    Expired(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limited: {0}")]
    TooManyRequests(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::SessionExpired => AppError::Expired("Session Expired".into()),
            ServiceError::AuthenticationFailed(source) => {
                AppError::Internal(format!("Authentication Failed: {source}"))
            }
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Upstream(err) if err.is_auth_expired() => {
                AppError::Expired("Token Expired".into())
            }
            ServiceError::Upstream(err @ UpstreamError::RateLimited { .. }) => {
                AppError::TooManyRequests(err.to_string())
            }
            ServiceError::Upstream(err) => AppError::Internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Expired(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

//! HTTP error mapping.
//!
//! Every failure leaving a handler is rendered in the Yggdrasil error
//! wire format `{"error", "errorMessage", "cause"?}` with the matching
//! status code. Semantic misses (unknown profile, dead session) are
//! not errors; handlers answer those with 204 directly.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use askr_core::auth::AuthError;
use askr_core::keys::KeyError;
use askr_core::models::wire::ErrorBody;
use askr_core::store::StoreError;
use askr_core::textures::TexturesError;

/// Convenience alias for handler return types.
pub type ApiResult<T> = Result<T, ApiError>;

/// Application-level errors with wire-format mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    ForbiddenOperation(String),

    #[error("{0}")]
    IllegalArgument(String),

    #[error("Invalid token.")]
    InvalidToken,

    #[error("internal: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::ForbiddenOperation(m) => {
                (StatusCode::FORBIDDEN, "ForbiddenOperationException", m.clone())
            }
            ApiError::IllegalArgument(m) => {
                (StatusCode::BAD_REQUEST, "IllegalArgumentException", m.clone())
            }
            ApiError::InvalidToken => {
                (StatusCode::FORBIDDEN, "InvalidToken", "Invalid token.".to_string())
            }
            ApiError::Internal(m) => {
                // The wire gets a generic message; the log keeps the
                // detail under a correlation id.
                let correlation = uuid::Uuid::new_v4();
                tracing::error!(%correlation, error = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    format!("Internal server error ({correlation})"),
                )
            }
        };
        let body = ErrorBody {
            error: kind.to_string(),
            error_message: message,
            cause: None,
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::SelectedProfileMismatch
            | AuthError::ProfileNotOwned => ApiError::ForbiddenOperation(e.to_string()),
            AuthError::InvalidToken => ApiError::InvalidToken,
            AuthError::ProfileAlreadySelected => ApiError::IllegalArgument(e.to_string()),
            AuthError::Encoding(m) => ApiError::Internal(m),
            AuthError::Store(inner) => inner.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            // Semantic misses are handled before errors propagate; a
            // NotFound reaching this point is a bug worth surfacing.
            StoreError::NotFound => ApiError::Internal("unexpected missing record".into()),
            StoreError::Internal(m) => ApiError::Internal(m),
        }
    }
}

impl From<TexturesError> for ApiError {
    fn from(e: TexturesError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<KeyError> for ApiError {
    fn from(e: KeyError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Internal(format!("response serialization: {e}"))
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(e: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::IllegalArgument(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_pick_the_right_kind() {
        assert!(matches!(
            ApiError::from(AuthError::InvalidCredentials),
            ApiError::ForbiddenOperation(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::InvalidToken),
            ApiError::InvalidToken
        ));
        assert!(matches!(
            ApiError::from(AuthError::ProfileAlreadySelected),
            ApiError::IllegalArgument(_)
        ));
    }
}

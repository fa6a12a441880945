//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::listing::FilterError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Filter(e) if e.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Filter(FilterError::UnknownResource(_)) => StatusCode::NOT_FOUND,
            AppError::Filter(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Client errors are described; everything else stays vague
        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "internal server error".to_string()
            }
            AppError::Filter(e) if e.is_internal() => {
                tracing::error!(error = %e, "listing query compilation failed");
                "internal server error".to_string()
            }
            AppError::Filter(e) => e.to_string(),
        };

        (status, body).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_bad_request() {
        let err = AppError::from(FilterError::InvalidSort("bogus".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "invalid sort 'bogus'");
    }

    #[test]
    fn unknown_resource_is_not_found() {
        let err = AppError::from(FilterError::UnknownResource("widgets".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn database_errors_are_internal() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "database error");
    }

    #[test]
    fn placeholder_mismatch_is_internal() {
        let err = AppError::from(FilterError::PlaceholderMismatch {
            placeholders: 2,
            args: 1,
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

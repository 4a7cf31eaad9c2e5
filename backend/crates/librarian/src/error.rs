//! Librarian Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rate_limit::RateLimitError;
use thiserror::Error;

pub type LibrarianResult<T> = Result<T, LibrarianError>;

#[derive(Debug, Error)]
pub enum LibrarianError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Daily question limit reached")]
    QuotaExceeded { retry_after_secs: u64 },

    #[error("The librarian is not available")]
    ModelUnavailable,

    #[error("Language model error: {0}")]
    Model(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Rate limit store error: {0}")]
    RateLimitStore(#[from] RateLimitError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LibrarianError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LibrarianError::NotFound(_) => ErrorKind::NotFound,
            LibrarianError::Validation(_) => ErrorKind::BadRequest,
            LibrarianError::QuotaExceeded { .. } => ErrorKind::TooManyRequests,
            LibrarianError::ModelUnavailable => ErrorKind::ServiceUnavailable,
            LibrarianError::Model(_) => ErrorKind::BadGateway,
            LibrarianError::Database(_)
            | LibrarianError::RateLimitStore(_)
            | LibrarianError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            LibrarianError::QuotaExceeded { retry_after_secs } => err.with_action(format!(
                "Try again in {} hours",
                retry_after_secs.div_ceil(3600).max(1)
            )),
            LibrarianError::ModelUnavailable => err.with_action("Try again later"),
            LibrarianError::Model(_) => {
                AppError::bad_gateway("The librarian could not answer right now")
                    .with_action("Try again later")
            }
            LibrarianError::Database(_)
            | LibrarianError::RateLimitStore(_)
            | LibrarianError::Internal(_) => AppError::internal("Internal server error"),
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            LibrarianError::Database(e) => {
                tracing::error!(error = %e, "Librarian database error");
            }
            LibrarianError::RateLimitStore(e) => {
                tracing::error!(error = %e, "Librarian rate limit store error");
            }
            LibrarianError::Internal(msg) => {
                tracing::error!(message = %msg, "Librarian internal error");
            }
            LibrarianError::Model(msg) => {
                tracing::warn!(message = %msg, "Language model request failed");
            }
            LibrarianError::QuotaExceeded { .. } => {
                tracing::warn!("Librarian daily quota exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "Librarian error");
            }
        }
    }
}

impl IntoResponse for LibrarianError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<LibrarianError> for AppError {
    fn from(err: LibrarianError) -> Self {
        err.log();
        err.to_app_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            LibrarianError::ModelUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            LibrarianError::Model("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            LibrarianError::QuotaExceeded { retry_after_secs: 60 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            LibrarianError::NotFound("Article").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_model_details_hidden() {
        let app = LibrarianError::Model("401 invalid api key sk-123".into()).to_app_error();
        assert_eq!(app.kind(), ErrorKind::BadGateway);
        assert!(!app.message().contains("sk-123"));
    }

    #[test]
    fn test_quota_action_in_hours() {
        let app = LibrarianError::QuotaExceeded {
            retry_after_secs: 5400,
        }
        .to_app_error();
        assert_eq!(app.action(), Some("Try again in 2 hours"));
    }
}

//! CMS Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type CmsResult<T> = Result<T, CmsError>;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Slug '{0}' is already in use")]
    SlugTaken(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CmsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CmsError::NotFound(_) => ErrorKind::NotFound,
            CmsError::Validation(_) => ErrorKind::BadRequest,
            CmsError::SlugTaken(_) | CmsError::Conflict(_) => ErrorKind::Conflict,
            CmsError::Database(_) | CmsError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            CmsError::SlugTaken(_) => AppError::new(self.kind(), self.to_string())
                .with_action("Choose a different slug or title"),
            CmsError::Database(_) | CmsError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            CmsError::Database(e) => {
                tracing::error!(error = %e, "CMS database error");
            }
            CmsError::Internal(msg) => {
                tracing::error!(message = %msg, "CMS internal error");
            }
            _ => {
                tracing::debug!(error = %self, "CMS error");
            }
        }
    }
}

impl IntoResponse for CmsError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<CmsError> for AppError {
    fn from(err: CmsError) -> Self {
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
            CmsError::SlugTaken("news".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CmsError::NotFound("Post").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CmsError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let app = CmsError::Internal("pool exhausted".into()).to_app_error();
        assert_eq!(app.kind(), ErrorKind::InternalServerError);
        assert!(!app.message().contains("pool"));
    }
}

//! CRM Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rate_limit::RateLimitError;
use thiserror::Error;

use crate::domain::entities::RegistrationStatus;

pub type CrmResult<T> = Result<T, CrmError>;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Consent to data processing is required")]
    ConsentRequired,

    #[error("An open registration for this email already exists")]
    DuplicateRegistration,

    #[error("Cannot move a registration from '{from}' to '{to}'")]
    InvalidTransition {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },

    #[error("Too many registrations from this address")]
    RateLimited { retry_after_secs: u64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Rate limit store error: {0}")]
    RateLimitStore(#[from] RateLimitError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CrmError::NotFound(_) => ErrorKind::NotFound,
            CrmError::Validation(_) | CrmError::ConsentRequired => ErrorKind::BadRequest,
            CrmError::DuplicateRegistration => ErrorKind::Conflict,
            CrmError::InvalidTransition { .. } => ErrorKind::UnprocessableEntity,
            CrmError::RateLimited { .. } => ErrorKind::TooManyRequests,
            CrmError::Database(_) | CrmError::RateLimitStore(_) | CrmError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            CrmError::RateLimited { retry_after_secs } => err.with_action(format!(
                "Try again in {} minutes",
                retry_after_secs.div_ceil(60).max(1)
            )),
            CrmError::DuplicateRegistration => {
                err.with_action("We already have your application and will contact you")
            }
            CrmError::Database(_) | CrmError::RateLimitStore(_) | CrmError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            CrmError::Database(e) => {
                tracing::error!(error = %e, "CRM database error");
            }
            CrmError::RateLimitStore(e) => {
                tracing::error!(error = %e, "CRM rate limit store error");
            }
            CrmError::Internal(msg) => {
                tracing::error!(message = %msg, "CRM internal error");
            }
            CrmError::RateLimited { .. } => {
                tracing::warn!("Registration rate limit exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "CRM error");
            }
        }
    }
}

impl IntoResponse for CrmError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<CrmError> for AppError {
    fn from(err: CrmError) -> Self {
        err.log();
        err.to_app_error()
    }
}

//! Auth Error Types
//!
//! Auth-specific failures, rendered through the unified
//! `kernel::error::AppError` problem-details body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_object::user_role::UserRole;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("User name already exists")]
    UserNameTaken,

    #[error("{0}")]
    InvalidUserName(String),

    #[error("{0}")]
    PasswordValidation(String),

    /// Wrong name or password. The two are never distinguished.
    #[error("Invalid user name or password")]
    InvalidCredentials,

    #[error("Account is temporarily locked after repeated failed sign-ins")]
    AccountLocked,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Session not found or expired")]
    SessionInvalid,

    #[error("Session fingerprint mismatch")]
    SessionFingerprintMismatch,

    #[error("This action requires the '{required}' role or higher")]
    InsufficientRole { required: UserRole },

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::UserNameTaken => ErrorKind::Conflict,
            AuthError::InvalidUserName(_)
            | AuthError::PasswordValidation(_)
            | AuthError::MissingHeader(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::SessionFingerprintMismatch => ErrorKind::Unauthorized,
            AuthError::AccountLocked => ErrorKind::Locked,
            AuthError::AccountDisabled | AuthError::InsufficientRole { .. } => {
                ErrorKind::Forbidden
            }
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::SessionInvalid | AuthError::SessionFingerprintMismatch => {
                err.with_action("Sign in again")
            }
            AuthError::AccountLocked => err.with_action("Try again in 15 minutes"),
            // Internals stay in the log
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid sign-in attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Sign-in attempt on locked account");
            }
            AuthError::SessionFingerprintMismatch => {
                tracing::warn!("Session fingerprint mismatch detected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.log();
        err.to_app_error()
    }
}

impl From<platform::client::FingerprintError> for AuthError {
    fn from(err: platform::client::FingerprintError) -> Self {
        match err {
            platform::client::FingerprintError::MissingHeader(header) => {
                AuthError::MissingHeader(header)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::UserNameTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::AccountLocked.status_code(), StatusCode::LOCKED);
        assert_eq!(
            AuthError::SessionInvalid.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InsufficientRole {
                required: UserRole::Moderator
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let app = AuthError::Internal("pool exploded".into()).to_app_error();
        assert_eq!(app.kind(), ErrorKind::InternalServerError);
        assert!(!app.message().contains("pool"));
    }

    #[test]
    fn test_insufficient_role_message() {
        let err = AuthError::InsufficientRole {
            required: UserRole::Admin,
        };
        assert!(err.to_string().contains("'admin'"));
    }
}

//! Forum Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::role_tier::{LimitedAction, Permission};

pub type ForumResult<T> = Result<T, ForumError>;

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Your role does not allow '{0}'")]
    PermissionDenied(Permission),

    /// The tier's limit for the action is zero
    #[error("Your role cannot use '{0}' yet")]
    ActionUnavailable(LimitedAction),

    #[error("Daily limit of {limit} {action} reached")]
    DailyLimitReached { action: LimitedAction, limit: u32 },

    #[error("You are banned from posting{}", ban_suffix(.until))]
    Banned { until: Option<DateTime<Utc>> },

    #[error("Topic is locked")]
    TopicLocked,

    #[error("Only the author can do this")]
    NotAuthor,

    #[error("The edit window for this post has closed")]
    EditWindowClosed,

    #[error("You cannot {0} your own post")]
    OwnPost(&'static str),

    /// Actor does not outrank the member or author
    #[error("You cannot moderate a member of equal or higher role")]
    Outranked,

    #[error("You cannot do this to yourself")]
    SelfAction,

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn ban_suffix(until: &Option<DateTime<Utc>>) -> String {
    until
        .map(|t| format!(" until {}", t.format("%Y-%m-%d %H:%M UTC")))
        .unwrap_or_default()
}

impl ForumError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForumError::NotFound(_) => ErrorKind::NotFound,
            ForumError::Validation(_) => ErrorKind::BadRequest,
            ForumError::PermissionDenied(_)
            | ForumError::ActionUnavailable(_)
            | ForumError::Banned { .. }
            | ForumError::NotAuthor
            | ForumError::EditWindowClosed
            | ForumError::OwnPost(_)
            | ForumError::Outranked
            | ForumError::SelfAction => ErrorKind::Forbidden,
            ForumError::DailyLimitReached { .. } => ErrorKind::TooManyRequests,
            ForumError::TopicLocked => ErrorKind::Locked,
            ForumError::Conflict(_) => ErrorKind::Conflict,
            ForumError::Database(_) | ForumError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            ForumError::DailyLimitReached { .. } => err.with_action("Try again tomorrow (UTC)"),
            ForumError::ActionUnavailable(_) => {
                err.with_action("Keep taking part to reach the next role")
            }
            ForumError::Database(_) | ForumError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            ForumError::Database(e) => {
                tracing::error!(error = %e, "Forum database error");
            }
            ForumError::Internal(msg) => {
                tracing::error!(message = %msg, "Forum internal error");
            }
            ForumError::Outranked | ForumError::PermissionDenied(_) => {
                tracing::warn!(error = %self, "Forum permission check failed");
            }
            _ => {
                tracing::debug!(error = %self, "Forum error");
            }
        }
    }
}

impl IntoResponse for ForumError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<ForumError> for AppError {
    fn from(err: ForumError) -> Self {
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
            ForumError::DailyLimitReached {
                action: LimitedAction::Posts,
                limit: 10
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ForumError::ActionUnavailable(LimitedAction::Votes).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ForumError::TopicLocked.status_code(), StatusCode::LOCKED);
        assert_eq!(
            ForumError::NotFound("Post").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_daily_limit_message_carries_limit() {
        let err = ForumError::DailyLimitReached {
            action: LimitedAction::Topics,
            limit: 2,
        };
        assert_eq!(err.to_string(), "Daily limit of 2 topics reached");
    }

    #[test]
    fn test_ban_message() {
        assert_eq!(
            ForumError::Banned { until: None }.to_string(),
            "You are banned from posting"
        );
        let until = DateTime::parse_from_rfc3339("2030-01-02T03:04:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(
            ForumError::Banned { until: Some(until) }
                .to_string()
                .ends_with("until 2030-01-02 03:04 UTC")
        );
    }

    #[test]
    fn test_database_details_hidden() {
        let app = ForumError::Database(sqlx::Error::RowNotFound).to_app_error();
        assert_eq!(app.kind(), ErrorKind::InternalServerError);
        assert!(!app.message().contains("row"));
    }
}

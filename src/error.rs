use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::database::migrations::MigrationError;
use crate::i18n::{Locale, Msg};
use crate::models::RegistrationStatus;
use crate::services::calendar_service::ScheduleError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("activity not found")]
    ActivityNotFound,
    #[error("activity is full")]
    ActivityFull,
    #[error("already registered ({0})")]
    AlreadyRegistered(RegistrationStatus),
    #[error("not registered for this activity")]
    NotRegistered,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("activity already exists")]
    ActivityExists,
    #[error("notification not found")]
    NotificationNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid input: {0:?}")]
    Invalid(Msg),
    #[error("unusable schedule: {0}")]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

/// The untranslated detail of an error response. The locale middleware
/// re-renders the body from it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub Msg);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ActivityNotFound
            | AppError::NotificationNotFound
            | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::ActivityFull
            | AppError::AlreadyRegistered(_)
            | AppError::NotRegistered
            | AppError::EmailTaken
            | AppError::ActivityExists
            | AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Schedule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Config(_)
            | AppError::Io(_)
            | AppError::Token(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> Msg {
        match self {
            AppError::ActivityNotFound => Msg::ActivityNotFound,
            AppError::ActivityFull => Msg::ActivityFull,
            AppError::AlreadyRegistered(RegistrationStatus::Enrolled) => Msg::AlreadyEnrolled,
            AppError::AlreadyRegistered(RegistrationStatus::Waitlisted) => Msg::AlreadyWaitlisted,
            AppError::NotRegistered => Msg::NotRegistered,
            AppError::EmailTaken => Msg::EmailTaken,
            AppError::InvalidCredentials => Msg::InvalidCredentials,
            AppError::Unauthorized => Msg::Unauthorized,
            AppError::Forbidden => Msg::Forbidden,
            AppError::ActivityExists => Msg::ActivityExists,
            AppError::NotificationNotFound => Msg::NotificationNotFound,
            AppError::UserNotFound => Msg::UserNotFound,
            AppError::Invalid(msg) => msg.clone(),
            AppError::Schedule(e) => Msg::InvalidSchedule {
                reason: e.to_string(),
            },
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Config(_)
            | AppError::Io(_)
            | AppError::Token(_)
            | AppError::Internal(_) => Msg::Internal,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let msg = self.message();
        let body = Json(json!({ "detail": msg.render(Locale::En) }));
        let mut response = (status, body).into_response();
        response.extensions_mut().insert(ErrorDetail(msg));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_detail() {
        let err = AppError::AlreadyRegistered(RegistrationStatus::Waitlisted);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), Msg::AlreadyWaitlisted);
    }

    #[test]
    fn server_errors_hide_internals() {
        let err = AppError::Internal("disk on fire".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), Msg::Internal);
    }
}

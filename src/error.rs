use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

use crate::views;

#[derive(Debug, ThisError)]
pub enum FolioError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid username or password")]
    Auth,

    #[error("Database error: {0}")]
    Storage(#[from] SqlxError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<argon2::password_hash::Error> for FolioError {
    fn from(e: argon2::password_hash::Error) -> Self {
        FolioError::PasswordHash(e.to_string())
    }
}

impl IntoResponse for FolioError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            FolioError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            FolioError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            FolioError::Auth => (StatusCode::UNAUTHORIZED, self.to_string()),
            FolioError::Storage(_)
            | FolioError::PasswordHash(_)
            | FolioError::Config(_)
            | FolioError::Io(_) => {
                error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        (status, Html(views::error_page(status, &message))).into_response()
    }
}

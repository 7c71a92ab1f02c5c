//! Reading Error Types
//!
//! Entry and cover-image errors mapped onto `kernel::error::AppError`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::database_error, kind::ErrorKind};
use platform::upload::UploadError;
use platform::url_guard::UnsafeUrl;
use thiserror::Error;

use crate::domain::value_objects::EntryStatus;

pub type ReadingResult<T> = Result<T, ReadingError>;

#[derive(Debug, Error)]
pub enum ReadingError {
    #[error("Entry not found")]
    EntryNotFound,

    /// Entry exists but belongs to someone else
    #[error("Not enough permissions to access this entry")]
    Forbidden,

    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// `status` query parameter outside the known set
    #[error("Invalid status. Must be one of: {}", EntryStatus::allowed())]
    InvalidStatusFilter,

    #[error("Link is not allowed: {0}")]
    UnsafeLink(#[from] UnsafeUrl),

    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Request body rejected before it reached the upload pipeline
    #[error("File exceeds maximum of {max} bytes")]
    BodyTooLarge { max: usize },

    #[error("Invalid request body")]
    InvalidBody(#[from] JsonRejection),

    #[error("Invalid query parameters")]
    InvalidQuery(#[from] QueryRejection),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReadingError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ReadingError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadingError::EntryNotFound => ErrorKind::NotFound,
            ReadingError::Forbidden => ErrorKind::Forbidden,
            ReadingError::Validation { .. }
            | ReadingError::UnsafeLink(_)
            | ReadingError::InvalidQuery(_) => ErrorKind::UnprocessableEntity,
            ReadingError::InvalidStatusFilter => ErrorKind::BadRequest,
            ReadingError::Upload(err) => match err {
                UploadError::FileTooLarge { .. } => ErrorKind::PayloadTooLarge,
                UploadError::InvalidFileType => ErrorKind::UnsupportedMediaType,
                UploadError::PathTraversal | UploadError::SymlinkInPath => {
                    ErrorKind::UnprocessableEntity
                }
                UploadError::Filesystem(_) | UploadError::Unexpected(_) => {
                    ErrorKind::InternalServerError
                }
            },
            ReadingError::BodyTooLarge { .. } => ErrorKind::PayloadTooLarge,
            ReadingError::InvalidBody(rejection) => AppError::from(rejection).kind(),
            ReadingError::Database(e) => database_error(e).kind(),
            ReadingError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            ReadingError::Validation { field, message } => {
                AppError::unprocessable(message.clone()).with_extra("field", *field)
            }
            ReadingError::UnsafeLink(reason) => AppError::unprocessable(self.to_string())
                .with_extra("field", "link")
                .with_extra("reason", reason.reason()),
            ReadingError::Upload(err) if self.kind().is_server_error() => {
                AppError::internal("File could not be stored").with_extra("reason", err.reason())
            }
            ReadingError::Upload(err) => {
                AppError::new(self.kind(), err.to_string()).with_extra("reason", err.reason())
            }
            ReadingError::BodyTooLarge { .. } => {
                AppError::payload_too_large(self.to_string()).with_extra("reason", "file_too_large")
            }
            ReadingError::InvalidBody(rejection) => AppError::from(rejection),
            ReadingError::InvalidQuery(rejection) => {
                AppError::unprocessable(rejection.body_text())
            }
            ReadingError::Database(e) => database_error(e),
            ReadingError::Internal(_) => AppError::internal("An unexpected error occurred"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            ReadingError::Database(e) => {
                tracing::error!(error = %e, "Reading database error");
            }
            ReadingError::Internal(msg) => {
                tracing::error!(message = %msg, "Reading internal error");
            }
            ReadingError::Upload(err) if self.kind().is_server_error() => {
                tracing::error!(reason = err.reason(), error = %err, "Cover upload failed");
            }
            ReadingError::Forbidden => {
                tracing::warn!("Entry access denied");
            }
            _ => {
                tracing::debug!(error = %self, "Reading error");
            }
        }
    }
}

impl IntoResponse for ReadingError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<ReadingError> for AppError {
    fn from(err: ReadingError) -> Self {
        err.log();
        err.to_app_error()
    }
}

impl From<tokio::task::JoinError> for ReadingError {
    fn from(err: tokio::task::JoinError) -> Self {
        ReadingError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_upload_status_mapping() {
        let cases = [
            (
                UploadError::FileTooLarge { size: 10, max: 5 },
                ErrorKind::PayloadTooLarge,
            ),
            (UploadError::InvalidFileType, ErrorKind::UnsupportedMediaType),
            (UploadError::PathTraversal, ErrorKind::UnprocessableEntity),
            (UploadError::SymlinkInPath, ErrorKind::UnprocessableEntity),
            (
                UploadError::Filesystem(io::Error::other("disk full")),
                ErrorKind::InternalServerError,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(ReadingError::from(err).kind(), kind);
        }
    }

    #[test]
    fn test_filesystem_detail_not_exposed() {
        let err = ReadingError::from(UploadError::Filesystem(io::Error::other("/srv/uploads")));
        let app = err.to_app_error();
        assert_eq!(app.message(), "File could not be stored");
        assert_eq!(app.extras()["reason"], "filesystem_error");
    }

    #[test]
    fn test_unsafe_link_extras() {
        let app = ReadingError::UnsafeLink(UnsafeUrl::EmptyHost).to_app_error();
        assert_eq!(app.kind(), ErrorKind::UnprocessableEntity);
        assert_eq!(app.extras()["field"], "link");
        assert_eq!(app.extras()["reason"], "empty_host");
    }

    #[test]
    fn test_status_filter_message_lists_values() {
        let err = ReadingError::InvalidStatusFilter;
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(err.to_string().contains("to_read"));
        assert!(err.to_string().contains("archived"));
    }
}

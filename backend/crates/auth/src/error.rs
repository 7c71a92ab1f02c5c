//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::database_error, kind::ErrorKind};
use platform::password::PasswordPolicyError;
use platform::token::TokenError;
use serde_json::Value;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user name or wrong password (indistinguishable on purpose)
    #[error("Incorrect username or password")]
    InvalidCredentials,

    /// Correct credentials for a deactivated account
    #[error("User account is inactive")]
    AccountInactive,

    /// User not found (admin operations)
    #[error("User not found")]
    UserNotFound,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Username already taken")]
    UserNameTaken,

    /// Input failed field validation
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// Request body could not be read as the expected JSON
    #[error("Invalid request body")]
    InvalidBody(#[from] JsonRejection),

    /// Password rejected by the policy
    #[error(transparent)]
    PasswordPolicy(#[from] PasswordPolicyError),

    /// Missing or malformed bearer credential
    #[error("Not authenticated")]
    MissingCredentials,

    /// Token failed signature/expiry/format checks
    #[error("Could not validate credentials")]
    InvalidToken(#[source] TokenError),

    /// Access token where a refresh token was expected, or vice versa
    #[error("Invalid token type")]
    WrongTokenKind,

    /// Token subject no longer exists or is inactive
    #[error("User not found or inactive")]
    SubjectRejected,

    #[error("Admin access required")]
    AdminRequired,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AuthError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::MissingCredentials
            | AuthError::InvalidToken(_)
            | AuthError::WrongTokenKind
            | AuthError::SubjectRejected => ErrorKind::Unauthorized,
            AuthError::AccountInactive | AuthError::AdminRequired => ErrorKind::Forbidden,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::EmailTaken | AuthError::UserNameTaken => ErrorKind::Conflict,
            AuthError::Validation { .. } | AuthError::PasswordPolicy(_) => {
                ErrorKind::UnprocessableEntity
            }
            AuthError::InvalidBody(rejection) => AppError::from(rejection).kind(),
            AuthError::Database(e) => database_error(e).kind(),
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Server-side causes are replaced by a generic message; the detail is
    /// only logged.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Validation { field, message } => {
                AppError::unprocessable(message.clone()).with_extra("field", *field)
            }
            AuthError::PasswordPolicy(err) => {
                let rules: Vec<Value> = err
                    .violations()
                    .iter()
                    .map(|rule| Value::from(rule.code()))
                    .collect();
                let errors: Vec<Value> = err
                    .violations()
                    .iter()
                    .map(|rule| Value::from(rule.message()))
                    .collect();
                AppError::unprocessable(err.to_string())
                    .with_extra("field", "password")
                    .with_extra("failed_rules", rules)
                    .with_extra("errors", errors)
            }
            AuthError::InvalidBody(rejection) => AppError::from(rejection),
            AuthError::Database(e) => database_error(e),
            AuthError::Internal(_) => AppError::internal("An unexpected error occurred"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidToken(e) => {
                tracing::warn!(reason = %e, "Rejected bearer token");
            }
            AuthError::WrongTokenKind => {
                tracing::warn!("Token of the wrong kind presented");
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
        let challenge = self.kind() == ErrorKind::Unauthorized;
        let mut response = self.to_app_error().into_response();
        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.log();
        err.to_app_error()
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(msg) => AuthError::Internal(msg),
            other => AuthError::InvalidToken(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::validate_policy;

    #[test]
    fn test_error_kinds() {
        assert_eq!(AuthError::InvalidCredentials.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::AccountInactive.kind(), ErrorKind::Forbidden);
        assert_eq!(AuthError::WrongTokenKind.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::EmailTaken.kind(), ErrorKind::Conflict);
        assert_eq!(AuthError::UserNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(AuthError::AdminRequired.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_password_policy_extras() {
        let err = AuthError::from(validate_policy("password123").unwrap_err());
        let app = err.to_app_error();
        assert_eq!(app.kind(), ErrorKind::UnprocessableEntity);
        let rules = app.extras()["failed_rules"].as_array().unwrap();
        assert!(rules.len() >= 3);
        assert_eq!(app.extras()["field"], "password");
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let app = AuthError::Internal("pool exhausted at db01".into()).to_app_error();
        assert_eq!(app.message(), "An unexpected error occurred");
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), 401);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let response = AuthError::AdminRequired.into_response();
        assert_eq!(response.status(), 403);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_token_error_mapping() {
        assert!(matches!(
            AuthError::from(TokenError::Expired),
            AuthError::InvalidToken(TokenError::Expired)
        ));
        assert!(matches!(
            AuthError::from(TokenError::Encoding("x".into())),
            AuthError::Internal(_)
        ));
    }
}

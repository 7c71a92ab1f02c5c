//! Error conversions
//!
//! Mapping of infrastructure errors onto [`AppError`], and the HTTP
//! rendering of [`AppError`] itself.

use super::app_error::AppError;
#[cfg(feature = "axum")]
use super::kind::ErrorKind;

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

/// Classify a database failure without exposing its text
///
/// Crate error enums keep the `sqlx::Error` for logging and use this for
/// the client-facing kind and message.
#[cfg(feature = "sqlx")]
pub fn database_error(err: &sqlx::Error) -> AppError {
    match err {
        sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
        sqlx::Error::PoolTimedOut => {
            AppError::service_unavailable("Database connection pool exhausted")
        }
        sqlx::Error::Database(db_err) => {
            // https://www.postgresql.org/docs/current/errcodes-appendix.html
            match db_err.code().as_deref() {
                // Class 23: integrity constraint violation
                Some("23000" | "23001" | "23503" | "23505") => {
                    AppError::conflict("Conflicting record")
                }
                Some("23502" | "23514") => AppError::bad_request("Constraint violation"),
                // Class 53: insufficient resources, class 57: operator intervention
                Some("53000" | "53100" | "53200" | "53300") => {
                    AppError::service_unavailable("Database resource exhausted")
                }
                Some("57000" | "57014" | "57P01" | "57P02" | "57P03") => {
                    AppError::service_unavailable("Database unavailable")
                }
                _ => AppError::internal("An unexpected error occurred"),
            }
        }
        sqlx::Error::Io(_) | sqlx::Error::PoolClosed => {
            AppError::service_unavailable("Database connection error")
        }
        _ => AppError::internal("An unexpected error occurred"),
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl From<&axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: &axum::extract::rejection::JsonRejection) -> Self {
        use axum::extract::rejection::JsonRejection;

        let kind = match rejection {
            JsonRejection::JsonDataError(_) => ErrorKind::UnprocessableEntity,
            JsonRejection::MissingJsonContentType(_) => ErrorKind::UnsupportedMediaType,
            _ => ErrorKind::BadRequest,
        };
        AppError::new(kind, rejection.body_text())
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::{StatusCode, header};

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details for HTTP APIs
        let problem = self.to_problem();

        if self.is_server_error() {
            tracing::error!(
                correlation_id = %problem.correlation_id(),
                status = problem.status(),
                detail = %problem.detail(),
                source = ?std::error::Error::source(&self)
                    .map(|e| super::mask::mask_sensitive(&e.to_string())),
                "Request failed"
            );
        } else {
            tracing::debug!(
                correlation_id = %problem.correlation_id(),
                status = problem.status(),
                detail = %problem.detail(),
                "Request rejected"
            );
        }

        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(problem.to_json()),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_database_error_hides_detail() {
        let app = database_error(&sqlx::Error::PoolTimedOut);
        assert_eq!(app.kind(), crate::error::kind::ErrorKind::ServiceUnavailable);

        let app = database_error(&sqlx::Error::Protocol("secret dsn".into()));
        assert_eq!(app.message(), "An unexpected error occurred");
    }

    #[cfg(feature = "axum")]
    #[test]
    fn test_problem_response_headers() {
        use axum::response::IntoResponse;

        let response = AppError::new(ErrorKind::Conflict, "Email already registered").into_response();
        assert_eq!(response.status(), 409);
        assert_eq!(
            response.headers()["content-type"],
            "application/problem+json"
        );
    }
}

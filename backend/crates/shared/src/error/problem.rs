//! Problem Details - RFC 7807 error records
//!
//! Every error body that leaves the process is built here. Construction
//! always generates a fresh correlation id, masks the detail and every
//! textual extra independently, and truncates the detail.
//!
//! Wire shape:
//! `{type, title, status, detail, correlation_id, ...extras}` with extras
//! merged flat at the top level.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::mask::mask_sensitive;

/// Maximum detail length (characters) after masking
pub const MAX_DETAIL_CHARS: usize = 1000;

const ELLIPSIS: &str = "...";

/// Base URI for problem types
pub const PROBLEM_TYPE_BASE: &str = "https://reading-list.dev/problems";

/// Problem record
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    type_uri: String,
    title: String,
    status: u16,
    detail: String,
    correlation_id: String,
    #[serde(flatten)]
    extras: Map<String, Value>,
}

impl Problem {
    /// Build a problem record
    ///
    /// ## Arguments
    /// * `status` - HTTP status code
    /// * `title` - Short, human-readable summary
    /// * `detail` - Explanation of this occurrence (masked and truncated)
    /// * `type_uri` - URI identifying the problem type
    /// * `extras` - Additional flat fields (string values masked)
    pub fn build(
        status: u16,
        title: impl Into<String>,
        detail: &str,
        type_uri: impl Into<String>,
        extras: Option<Map<String, Value>>,
    ) -> Self {
        let extras = extras
            .map(|map| {
                map.into_iter()
                    .filter(|(key, _)| !is_reserved_key(key))
                    .map(|(key, value)| (key, mask_value(value)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status,
            detail: truncate_detail(mask_sensitive(detail)),
            correlation_id: Uuid::new_v4().to_string(),
            extras,
        }
    }

    /// 422 Validation Error
    ///
    /// `value` is the offending input; it is masked and echoed both in the
    /// detail and as `invalid_value`.
    pub fn validation(field: &str, message: &str, value: Option<&str>) -> Self {
        let mut detail = format!("Validation failed for field '{}': {}", field, message);
        if let Some(value) = value {
            detail.push_str(&format!(" (value: {})", mask_sensitive(value)));
        }

        let mut extras = Map::new();
        extras.insert("field".into(), Value::String(field.to_string()));
        extras.insert(
            "invalid_value".into(),
            value.map_or(Value::Null, |v| Value::String(v.to_string())),
        );

        Self::build(
            422,
            "Validation Error",
            &detail,
            problem_type("validation-error"),
            Some(extras),
        )
    }

    /// 401 Authentication Required
    pub fn authentication(detail: &str) -> Self {
        Self::build(
            401,
            "Authentication Required",
            detail,
            problem_type("authentication-error"),
            None,
        )
    }

    /// 403 Access Denied
    pub fn authorization(detail: &str) -> Self {
        Self::build(
            403,
            "Access Denied",
            detail,
            problem_type("authorization-error"),
            None,
        )
    }

    /// 404 Resource Not Found
    pub fn not_found(resource: &str, identifier: &str) -> Self {
        let mut extras = Map::new();
        extras.insert("resource".into(), Value::String(resource.to_string()));
        extras.insert("identifier".into(), Value::String(identifier.to_string()));

        Self::build(
            404,
            "Resource Not Found",
            &format!("{} with identifier '{}' not found", resource, identifier),
            problem_type("not-found"),
            Some(extras),
        )
    }

    /// 500 Internal Server Error
    pub fn internal(detail: &str) -> Self {
        Self::build(
            500,
            "Internal Server Error",
            detail,
            problem_type("internal-error"),
            None,
        )
    }

    /// Merge additional extras (masked like the originals)
    pub fn with_extras(mut self, extras: Map<String, Value>) -> Self {
        for (key, value) in extras {
            if !is_reserved_key(&key) {
                self.extras.insert(key, mask_value(value));
            }
        }
        self
    }

    pub fn type_uri(&self) -> &str {
        &self.type_uri
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn extras(&self) -> &Map<String, Value> {
        &self.extras
    }

    /// Serialize to a JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Build a problem type URI under [`PROBLEM_TYPE_BASE`]
pub fn problem_type(slug: &str) -> String {
    format!("{}/{}", PROBLEM_TYPE_BASE, slug)
}

/// Extras may not shadow the fixed members
fn is_reserved_key(key: &str) -> bool {
    matches!(
        key,
        "type" | "title" | "status" | "detail" | "correlation_id"
    )
}

fn mask_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(mask_sensitive(&s)),
        other => other,
    }
}

fn truncate_detail(detail: String) -> String {
    if detail.chars().count() <= MAX_DETAIL_CHARS {
        return detail;
    }
    let keep = MAX_DETAIL_CHARS - ELLIPSIS.len();
    let mut truncated: String = detail.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_problem_structure() {
        let problem = Problem::build(400, "Bad Request", "Invalid input data", "about:blank", None);
        let json = problem.to_json();

        assert_eq!(json["type"], "about:blank");
        assert_eq!(json["title"], "Bad Request");
        assert_eq!(json["status"], 400);
        assert_eq!(json["detail"], "Invalid input data");
        assert!(json["correlation_id"].is_string());
    }

    #[test]
    fn test_correlation_id_is_fresh() {
        let a = Problem::internal("boom");
        let b = Problem::internal("boom");
        assert_ne!(a.correlation_id(), b.correlation_id());
        assert!(Uuid::parse_str(a.correlation_id()).is_ok());
    }

    #[test]
    fn test_extras_are_flattened_and_masked() {
        let mut extras = Map::new();
        extras.insert("field".into(), Value::String("email".into()));
        extras.insert("contact".into(), Value::String("ping a@b.com".into()));
        extras.insert("attempts".into(), Value::from(3));

        let problem = Problem::build(422, "Validation Error", "bad", "about:blank", Some(extras));
        let json = problem.to_json();

        assert_eq!(json["field"], "email");
        assert_eq!(json["contact"], "ping ***@***.***");
        assert_eq!(json["attempts"], 3);
    }

    #[test]
    fn test_extras_cannot_override_members() {
        let mut extras = Map::new();
        extras.insert("status".into(), Value::from(200));
        let problem = Problem::build(500, "Internal Server Error", "x", "about:blank", Some(extras));
        assert_eq!(problem.to_json()["status"], 500);
    }

    #[test]
    fn test_detail_is_masked() {
        let problem = Problem::internal("login failed: password=hunter2");
        assert_eq!(problem.detail(), "login failed: password=***");
    }

    #[test]
    fn test_detail_length_limit() {
        let problem = Problem::build(400, "Error", &"x".repeat(2000), "about:blank", None);
        assert_eq!(problem.detail().chars().count(), MAX_DETAIL_CHARS);
        assert!(problem.detail().ends_with("..."));

        let exact = "y".repeat(MAX_DETAIL_CHARS);
        let problem = Problem::build(400, "Error", &exact, "about:blank", None);
        assert_eq!(problem.detail(), exact);
    }

    #[test]
    fn test_validation_problem() {
        let problem = Problem::validation("email", "Invalid email format", Some("me@x.io"));
        assert_eq!(problem.status(), 422);
        assert_eq!(problem.title(), "Validation Error");
        assert!(problem.type_uri().ends_with("/validation-error"));
        assert_eq!(problem.extras()["field"], "email");
        assert_eq!(problem.extras()["invalid_value"], "***@***.***");
        assert!(!problem.detail().contains("me@x.io"));
    }

    #[test]
    fn test_specialized_constructors() {
        let p = Problem::authentication("Invalid credentials");
        assert_eq!((p.status(), p.title()), (401, "Authentication Required"));

        let p = Problem::authorization("Admin access required");
        assert_eq!((p.status(), p.title()), (403, "Access Denied"));

        let p = Problem::not_found("Entry", "123");
        assert_eq!((p.status(), p.title()), (404, "Resource Not Found"));
        assert_eq!(p.detail(), "Entry with identifier '123' not found");
        assert_eq!(p.extras()["resource"], "Entry");

        let p = Problem::internal("Database connection failed");
        assert_eq!((p.status(), p.title()), (500, "Internal Server Error"));
    }
}

//! Reading Router

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::domain::repository::EntryRepository;
use crate::presentation::handlers::{self, ReadingAppState};

/// Create the entries router for any repository implementation
///
/// Every route expects a `CurrentUser` in the request extensions, so the
/// router must be mounted behind `auth::require_auth`.
pub fn reading_router<R>(state: ReadingAppState<R>) -> Router
where
    R: EntryRepository + Clone + Send + Sync + 'static,
{
    let max_upload = state.uploads.max_bytes();

    Router::new()
        .route(
            "/entries",
            post(handlers::create_entry::<R>).get(handlers::list_entries::<R>),
        )
        .route(
            "/entries/{id}",
            get(handlers::get_entry::<R>)
                .patch(handlers::update_entry::<R>)
                .delete(handlers::delete_entry::<R>),
        )
        .route(
            "/entries/{id}/cover",
            put(handlers::put_cover::<R>)
                .delete(handlers::delete_cover::<R>)
                .layer(DefaultBodyLimit::max(max_upload)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ReadingConfig;
    use crate::application::testing::PNG;
    use crate::infra::memory::InMemoryEntryRepository;
    use auth::CurrentUser;
    use auth::domain::value_object::user_role::UserRole;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use kernel::id::UserId;
    use platform::upload::{UploadConfig, UploadStore};
    use serde_json::{Value, json};
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(root: &Path) -> Router {
        reading_router(ReadingAppState::new(
            Arc::new(InMemoryEntryRepository::new()),
            Arc::new(UploadStore::new(UploadConfig::new(root).with_max_bytes(64))),
            ReadingConfig::default(),
        ))
    }

    fn reader(role: UserRole) -> CurrentUser {
        CurrentUser {
            user_id: UserId::new(),
            user_name: "reader".into(),
            role,
        }
    }

    fn request(
        method: &str,
        uri: &str,
        as_user: &CurrentUser,
        content_type: Option<&str>,
        body: Body,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let mut req = builder.body(body).unwrap();
        req.extensions_mut().insert(as_user.clone());
        req
    }

    fn json_request(method: &str, uri: &str, as_user: &CurrentUser, body: Value) -> Request<Body> {
        request(
            method,
            uri,
            as_user,
            Some("application/json"),
            Body::from(body.to_string()),
        )
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(app: &Router, as_user: &CurrentUser, title: &str) -> Value {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/entries",
                as_user,
                json!({"title": title, "kind": "book"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn test_create_get_patch_delete() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let owner = reader(UserRole::User);

        let entry = create(&app, &owner, "Dune").await;
        assert_eq!(entry["status"], "to_read");
        let uri = format!("/entries/{}", entry["id"].as_str().unwrap());

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &uri,
                &owner,
                json!({"status": "completed"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let patched = json_body(response).await;
        assert_eq!(patched["status"], "completed");
        assert_eq!(patched["title"], "Dune");

        let response = app
            .clone()
            .oneshot(request("DELETE", &uri, &owner, None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request("GET", &uri, &owner, None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_foreign_entry_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let entry = create(&app, &reader(UserRole::User), "Private").await;
        let uri = format!("/entries/{}", entry["id"].as_str().unwrap());

        let response = app
            .clone()
            .oneshot(request("GET", &uri, &reader(UserRole::User), None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/problem+json"
        );

        let response = app
            .oneshot(request("GET", &uri, &reader(UserRole::Admin), None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_validation() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let owner = reader(UserRole::User);
        create(&app, &owner, "One").await;

        let response = app
            .clone()
            .oneshot(request("GET", "/entries?limit=5", &owner, None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = json_body(response).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["limit"], 5);
        assert_eq!(page["offset"], 0);

        let response = app
            .clone()
            .oneshot(request("GET", "/entries?status=done", &owner, None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request("GET", "/entries?limit=0", &owner, None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unsafe_link_is_422() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(json_request(
                "POST",
                "/entries",
                &reader(UserRole::User),
                json!({"title": "Metadata", "kind": "article", "link": "https://127.0.0.1/"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let problem = json_body(response).await;
        assert_eq!(problem["field"], "link");
        assert_eq!(problem["reason"], "blocked_address");
    }

    #[tokio::test]
    async fn test_cover_upload_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let owner = reader(UserRole::User);
        let entry = create(&app, &owner, "Dune").await;
        let uri = format!("/entries/{}/cover", entry["id"].as_str().unwrap());

        let response = app
            .clone()
            .oneshot(request("PUT", &uri, &owner, Some("image/png"), Body::from(PNG)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cover = json_body(response).await["cover_image"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(dir.path().join(&cover).is_file());

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &uri,
                &owner,
                Some("image/png"),
                Body::from("plain text, not an image"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(json_body(response).await["reason"], "invalid_file_type");

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &uri,
                &owner,
                Some("image/png"),
                Body::from(vec![0u8; 128]),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(response).await["reason"], "file_too_large");

        let response = app
            .oneshot(request("DELETE", &uri, &owner, None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await["cover_image"].is_null());
        assert!(!dir.path().join(&cover).exists());
    }
}

//! API Server composition
//!
//! Builds the `/api/v1` router from the auth and reading modules and
//! wraps it in the cross-cutting layers (request ids, tracing, CORS).

pub mod config;

use std::net::SocketAddr;

use auth::domain::repository::UserRepository;
use auth::{AuthAppState, auth_router, require_auth};
use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use platform::client::extract_client_ip;
use reading::domain::repository::EntryRepository;
use reading::{ReadingAppState, reading_router};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use config::AppConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Compose the full application router
///
/// Entry routes sit behind the bearer guard; `/auth` handles its own
/// public and protected routes.
pub fn build_app<U, E>(
    auth_state: AuthAppState<U>,
    reading_state: ReadingAppState<E>,
    frontend_origins: &[String],
) -> Router
where
    U: UserRepository + Clone + Send + Sync + 'static,
    E: EntryRepository + Clone + Send + Sync + 'static,
{
    let entries = reading_router(reading_state)
        .route_layer(from_fn_with_state(auth_state.clone(), require_auth::<U>));

    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_router(auth_state))
        .merge(entries);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", api)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(cors(frontend_origins)),
        )
}

fn cors(frontend_origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
}

fn request_span(request: &Request) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");
    let direct_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let client_ip = extract_client_ip(request.headers(), direct_ip);

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id,
        client_ip = ?client_ip,
    )
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "reading-list",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> AppError {
    AppError::not_found("Route not found")
}

//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::domain::repository::UserRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_auth;

/// Create the Auth router for any repository implementation
///
/// Mounted under `/auth`; `me` and the admin routes sit behind
/// [`require_auth`].
pub fn auth_router<R>(state: AuthAppState<R>) -> Router
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let protected = Router::new()
        .route("/me", get(handlers::me::<R>))
        .route("/users/{id}/activate", post(handlers::activate_user::<R>))
        .route("/users/{id}/deactivate", post(handlers::deactivate_user::<R>))
        .route_layer(from_fn_with_state(state.clone(), require_auth::<R>));

    Router::new()
        .route("/register", post(handlers::register::<R>))
        .route("/login", post(handlers::login::<R>))
        .route("/refresh", post(handlers::refresh::<R>))
        .route("/logout", post(handlers::logout))
        .merge(protected)
        .with_state(state)
}

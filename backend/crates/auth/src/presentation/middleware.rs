//! Auth Middleware
//!
//! Bearer-token guard for protected routes.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use platform::client::extract_bearer_token;

use crate::application::{AuthenticateUseCase, CurrentUser};
use crate::domain::repository::UserRepository;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Middleware that requires a valid access token
///
/// Install with `axum::middleware::from_fn_with_state(state, require_auth::<R>)`.
/// On success the caller is available to handlers as a [`CurrentUser`].
pub async fn require_auth<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let token = extract_bearer_token(req.headers()).map_err(|e| {
        tracing::debug!(reason = %e, "Bearer credential rejected");
        AuthError::MissingCredentials
    })?;

    let user = AuthenticateUseCase::new(state.repo.clone(), state.services.clone())
        .execute(token)
        .await?;

    req.extensions_mut().insert(CurrentUser::from(&user));

    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

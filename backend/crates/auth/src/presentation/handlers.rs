//! HTTP Handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use kernel::id::UserId;
use std::sync::Arc;

use crate::application::{
    AuthServices, CurrentUser, LoginInput, LoginUseCase, RefreshUseCase, RegisterInput,
    RegisterUseCase, SetActiveUseCase,
};
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UserResponse,
};

/// Shared state for auth handlers and the bearer middleware
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub services: Arc<AuthServices>,
}

impl<R> AuthAppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, services: Arc<AuthServices>) -> Self {
        Self { repo, services }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /auth/register
pub async fn register<R>(
    State(state): State<AuthAppState<R>>,
    req: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult<(StatusCode, Json<UserResponse>)>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let Json(req) = req?;
    let use_case = RegisterUseCase::new(state.repo.clone(), state.services.clone());

    let user = use_case
        .execute(RegisterInput {
            email: req.email,
            user_name: req.username,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

// ============================================================================
// Login / Refresh / Logout
// ============================================================================

/// POST /auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    req: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<Json<TokenResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let Json(req) = req?;
    let use_case = LoginUseCase::new(state.repo.clone(), state.services.clone());

    let tokens = use_case
        .execute(LoginInput {
            user_name: req.username,
            password: req.password,
        })
        .await?;

    Ok(Json(tokens.into()))
}

/// POST /auth/refresh
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    req: Result<Json<RefreshRequest>, JsonRejection>,
) -> AuthResult<Json<TokenResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let Json(req) = req?;
    let use_case = RefreshUseCase::new(state.repo.clone(), state.services.clone());

    let tokens = use_case.execute(&req.refresh_token).await?;

    Ok(Json(tokens.into()))
}

/// POST /auth/logout
///
/// Tokens are stateless; the client discards them.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

// ============================================================================
// Authenticated
// ============================================================================

/// GET /auth/me
pub async fn me<R>(
    State(state): State<AuthAppState<R>>,
    current: CurrentUser,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let user = state
        .repo
        .find_by_id(&current.user_id)
        .await?
        .ok_or(AuthError::SubjectRejected)?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /auth/users/{id}/activate
pub async fn activate_user<R>(
    State(state): State<AuthAppState<R>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    set_active(state, current, &id, true).await
}

/// POST /auth/users/{id}/deactivate
pub async fn deactivate_user<R>(
    State(state): State<AuthAppState<R>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    set_active(state, current, &id, false).await
}

async fn set_active<R>(
    state: AuthAppState<R>,
    current: CurrentUser,
    id: &str,
    active: bool,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    // Admin check first so non-admins learn nothing about ids
    if !current.is_admin() {
        return Err(AuthError::AdminRequired);
    }
    let target: UserId = id.parse().map_err(|_| AuthError::UserNotFound)?;

    let user = SetActiveUseCase::new(state.repo.clone())
        .execute(&current, target, active)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

//! Refresh Use Case
//!
//! Exchanges a refresh token for a fresh token pair.

use std::sync::Arc;

use kernel::id::UserId;
use platform::token::TokenKind;

use crate::application::config::AuthServices;
use crate::application::login::TokenPair;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

/// Refresh use case
pub struct RefreshUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    services: Arc<AuthServices>,
}

impl<U> RefreshUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, services: Arc<AuthServices>) -> Self {
        Self {
            user_repo,
            services,
        }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let user = resolve_subject(
            self.user_repo.as_ref(),
            &self.services,
            refresh_token,
            TokenKind::Refresh,
        )
        .await?;
        let tokens = TokenPair::issue(&self.services, &user)?;

        tracing::info!(user_id = %user.user_id, "Token refreshed");

        Ok(tokens)
    }
}

/// Decode `token`, require `expected` kind and return its active subject
pub(crate) async fn resolve_subject<U>(
    user_repo: &U,
    services: &AuthServices,
    token: &str,
    expected: TokenKind,
) -> AuthResult<User>
where
    U: UserRepository,
{
    let claims = services.tokens.decode(token)?;
    if claims.kind != expected {
        return Err(AuthError::WrongTokenKind);
    }

    let user_id: UserId = claims.sub.parse().map_err(|_| AuthError::SubjectRejected)?;

    match user_repo.find_by_id(&user_id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(AuthError::SubjectRejected),
    }
}

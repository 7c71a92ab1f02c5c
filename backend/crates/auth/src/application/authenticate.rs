//! Authenticate Use Case
//!
//! Resolves a bearer access token to the acting user.

use std::sync::Arc;

use kernel::id::UserId;
use platform::token::TokenKind;

use crate::application::config::AuthServices;
use crate::application::refresh::resolve_subject;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_role::UserRole;
use crate::error::AuthResult;

/// The authenticated caller, placed in request extensions by the middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub user_name: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            user_name: user.user_name.original().to_string(),
            role: user.user_role,
        }
    }
}

pub struct AuthenticateUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    services: Arc<AuthServices>,
}

impl<U> AuthenticateUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, services: Arc<AuthServices>) -> Self {
        Self {
            user_repo,
            services,
        }
    }

    /// Access token only; refresh tokens are refused
    pub async fn execute(&self, access_token: &str) -> AuthResult<User> {
        resolve_subject(
            self.user_repo.as_ref(),
            &self.services,
            access_token,
            TokenKind::Access,
        )
        .await
    }
}

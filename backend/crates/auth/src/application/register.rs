//! Register Use Case
//!
//! Creates a new user account.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthServices;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub user_name: String,
    pub password: String,
}

/// Register use case
pub struct RegisterUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    services: Arc<AuthServices>,
}

impl<U> RegisterUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, services: Arc<AuthServices>) -> Self {
        Self {
            user_repo,
            services,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<User> {
        let email =
            Email::new(&input.email).map_err(|e| AuthError::validation("email", e.to_string()))?;
        let user_name = UserName::new(&input.user_name)
            .map_err(|e| AuthError::validation("username", e.to_string()))?;
        let password = Arc::new(ClearTextPassword::new(input.password)?);

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }
        if self.user_repo.exists_by_user_name(&user_name).await? {
            return Err(AuthError::UserNameTaken);
        }

        let password_hash = self.services.hash_password(password).await?;
        let user = User::new(email, user_name, password_hash, UserRole::User);

        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            "User registered"
        );

        Ok(user)
    }
}

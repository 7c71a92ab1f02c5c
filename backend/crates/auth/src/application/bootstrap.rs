//! Admin Bootstrap
//!
//! Creates the operator account at startup when it does not exist yet.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthServices;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// Operator account credentials
pub struct AdminSeed {
    pub email: String,
    pub user_name: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

pub struct BootstrapAdminUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    services: Arc<AuthServices>,
}

impl<U> BootstrapAdminUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, services: Arc<AuthServices>) -> Self {
        Self {
            user_repo,
            services,
        }
    }

    /// Returns the created admin, or `None` when the user name is already taken
    pub async fn execute(&self, seed: AdminSeed) -> AuthResult<Option<User>> {
        let email =
            Email::new(&seed.email).map_err(|e| AuthError::validation("email", e.to_string()))?;
        // Operator accounts may use reserved names such as "admin"
        let user_name = UserName::new_with_reserved(&seed.user_name, &[])
            .map_err(|e| AuthError::validation("username", e.to_string()))?;

        if self.user_repo.exists_by_user_name(&user_name).await? {
            tracing::debug!(user_name = %user_name, "Admin account already present");
            return Ok(None);
        }

        let password = Arc::new(ClearTextPassword::new(seed.password)?);
        let password_hash = self.services.hash_password(password).await?;
        let user = User::new(email, user_name, password_hash, UserRole::Admin);

        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            "Admin account created"
        );

        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{STRONG_PASSWORD, services};
    use crate::infra::memory::InMemoryUserRepository;

    fn seed(password: &str) -> AdminSeed {
        AdminSeed {
            email: "admin@example.com".into(),
            user_name: "admin".into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_creates_once() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let uc = BootstrapAdminUseCase::new(repo, services());

        let created = uc.execute(seed(STRONG_PASSWORD)).await.unwrap().unwrap();
        assert!(created.is_admin());
        assert!(uc.execute(seed(STRONG_PASSWORD)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_enforces_policy() {
        let repo = Arc::new(InMemoryUserRepository::new());
        assert!(matches!(
            BootstrapAdminUseCase::new(repo, services())
                .execute(seed("admin"))
                .await,
            Err(AuthError::PasswordPolicy(_))
        ));
    }

    #[test]
    fn test_seed_debug_redacts_password() {
        let rendered = format!("{:?}", seed(STRONG_PASSWORD));
        assert!(!rendered.contains(STRONG_PASSWORD));
    }
}

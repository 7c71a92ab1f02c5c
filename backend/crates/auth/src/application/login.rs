//! Login Use Case
//!
//! Verifies a user name and password and issues a token pair.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthServices;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_name::UserName;
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub user_name: String,
    pub password: String,
}

/// Access and refresh tokens for one subject
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub(crate) fn issue(services: &AuthServices, user: &User) -> AuthResult<Self> {
        let subject = user.user_id.to_string();
        Ok(Self {
            access_token: services.tokens.issue_access(&subject)?,
            refresh_token: services.tokens.issue_refresh(&subject)?,
        })
    }
}

/// Login use case
pub struct LoginUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    services: Arc<AuthServices>,
}

impl<U> LoginUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, services: Arc<AuthServices>) -> Self {
        Self {
            user_repo,
            services,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<TokenPair> {
        let user_name = UserName::for_lookup(&input.user_name);
        let password = Arc::new(ClearTextPassword::for_verification(input.password));

        let user = self.user_repo.find_by_user_name(&user_name).await?;
        let stored = user.as_ref().map(|u| u.password_hash.clone());

        // Unknown names still pay for a verification
        let verified = self
            .services
            .verify_password(Arc::clone(&password), stored)
            .await?;

        let user = match user {
            Some(user) if verified => user,
            _ => {
                tracing::warn!(user_name = %user_name.canonical(), "Failed login attempt");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !user.is_active {
            tracing::warn!(user_id = %user.user_id, "Login refused for inactive account");
            return Err(AuthError::AccountInactive);
        }

        if self.services.hasher.needs_rehash(&user.password_hash) {
            self.upgrade_hash(&user, password).await;
        }

        let tokens = TokenPair::issue(&self.services, &user)?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            "User logged in"
        );

        Ok(tokens)
    }

    /// Re-hash under the current parameters; a failure only skips the upgrade
    ///
    /// Only the hash column is written, so a role or activity change made
    /// since `user` was read survives.
    async fn upgrade_hash(&self, user: &User, password: Arc<ClearTextPassword>) {
        let result = match self.services.hash_password(password).await {
            Ok(hash) => {
                self.user_repo
                    .update_password_hash(&user.user_id, &hash)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => tracing::info!(user_id = %user.user_id, "Password hash upgraded"),
            Err(e) => tracing::warn!(user_id = %user.user_id, error = %e, "Password rehash failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{STRONG_PASSWORD, register, services};
    use crate::domain::value_object::{email::Email, user_name::UserName};
    use crate::infra::memory::InMemoryUserRepository;
    use kernel::id::UserId;
    use platform::password::{CredentialHasher, HashedPassword, HasherConfig};
    use platform::token::TokenKind;

    /// Deactivates the account right after it is read, as an admin acting
    /// between lookup and rehash would
    struct DeactivatedAfterLookup(Arc<InMemoryUserRepository>);

    impl UserRepository for DeactivatedAfterLookup {
        async fn create(&self, user: &User) -> AuthResult<()> {
            self.0.create(user).await
        }

        async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
            self.0.find_by_id(user_id).await
        }

        async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
            let found = self.0.find_by_user_name(user_name).await?;
            if let Some(user) = &found {
                let mut deactivated = user.clone();
                deactivated.set_active(false);
                self.0.update(&deactivated).await?;
            }
            Ok(found)
        }

        async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
            self.0.exists_by_email(email).await
        }

        async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
            self.0.exists_by_user_name(user_name).await
        }

        async fn update(&self, user: &User) -> AuthResult<()> {
            self.0.update(user).await
        }

        async fn update_password_hash(
            &self,
            user_id: &UserId,
            password_hash: &HashedPassword,
        ) -> AuthResult<()> {
            self.0.update_password_hash(user_id, password_hash).await
        }
    }

    fn outdated_hash() -> HashedPassword {
        CredentialHasher::new(
            HasherConfig {
                memory_kib: 2048,
                iterations: 1,
                parallelism: 1,
            },
            None,
        )
        .unwrap()
        .hash(&ClearTextPassword::for_verification(STRONG_PASSWORD.into()))
        .unwrap()
    }

    fn input(user_name: &str, password: &str) -> LoginInput {
        LoginInput {
            user_name: user_name.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_login_success() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let services = services();
        let user = register(&repo, &services, "reader").await;

        let tokens = LoginUseCase::new(repo, services.clone())
            .execute(input("Reader", STRONG_PASSWORD))
            .await
            .unwrap();

        let access = services.tokens.decode(&tokens.access_token).unwrap();
        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(access.sub, user.user_id.to_string());
        let refresh = services.tokens.decode(&tokens.refresh_token).unwrap();
        assert_eq!(refresh.kind, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let services = services();
        register(&repo, &services, "reader").await;
        let uc = LoginUseCase::new(repo, services);

        let wrong_password = uc.execute(input("reader", "Wr0ng!Passw0rd")).await.unwrap_err();
        let unknown_user = uc.execute(input("nobody", STRONG_PASSWORD)).await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_login_inactive_after_correct_password() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let services = services();
        let mut user = register(&repo, &services, "reader").await;
        user.set_active(false);
        repo.update(&user).await.unwrap();

        let uc = LoginUseCase::new(repo, services);
        assert!(matches!(
            uc.execute(input("reader", STRONG_PASSWORD)).await,
            Err(AuthError::AccountInactive)
        ));
        // Wrong password on an inactive account stays a credential failure
        assert!(matches!(
            uc.execute(input("reader", "Wr0ng!Passw0rd")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_upgrades_outdated_hash() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let services = services();
        let mut user = register(&repo, &services, "reader").await;

        let old_hash = outdated_hash();
        user.set_password_hash(old_hash.clone());
        repo.update(&user).await.unwrap();

        LoginUseCase::new(repo.clone(), services.clone())
            .execute(input("reader", STRONG_PASSWORD))
            .await
            .unwrap();

        let stored = repo.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, old_hash);
        assert!(!services.hasher.needs_rehash(&stored.password_hash));
    }

    #[tokio::test]
    async fn test_rehash_keeps_concurrent_deactivation() {
        let inner = Arc::new(InMemoryUserRepository::new());
        let services = services();
        let mut user = register(&inner, &services, "reader").await;
        let old_hash = outdated_hash();
        user.set_password_hash(old_hash.clone());
        inner.update(&user).await.unwrap();

        let repo = Arc::new(DeactivatedAfterLookup(inner.clone()));
        LoginUseCase::new(repo, services.clone())
            .execute(input("reader", STRONG_PASSWORD))
            .await
            .unwrap();

        let stored = inner.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_ne!(stored.password_hash, old_hash);
    }
}

//! Set Active Use Case
//!
//! Admin-only activation and deactivation of accounts.

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::authenticate::CurrentUser;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

pub struct SetActiveUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> SetActiveUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(
        &self,
        actor: &CurrentUser,
        target: UserId,
        active: bool,
    ) -> AuthResult<User> {
        if !actor.is_admin() {
            tracing::warn!(
                actor = %actor.user_id,
                target = %target,
                "Non-admin attempted to change account state"
            );
            return Err(AuthError::AdminRequired);
        }

        let mut user = self
            .user_repo
            .find_by_id(&target)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_active != active {
            user.set_active(active);
            self.user_repo.update(&user).await?;
        }

        tracing::info!(
            actor = %actor.user_id,
            target = %user.user_id,
            is_active = active,
            "Account state changed"
        );

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{register, services};
    use crate::domain::value_object::user_role::UserRole;
    use crate::infra::memory::InMemoryUserRepository;

    fn admin() -> CurrentUser {
        CurrentUser {
            user_id: UserId::new(),
            user_name: "root_admin".into(),
            role: UserRole::Admin,
        }
    }

    #[tokio::test]
    async fn test_admin_toggles_account() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let user = register(&repo, &services(), "reader").await;
        let uc = SetActiveUseCase::new(repo.clone());

        let updated = uc.execute(&admin(), user.user_id, false).await.unwrap();
        assert!(!updated.is_active);
        assert!(!repo.find_by_id(&user.user_id).await.unwrap().unwrap().is_active);

        let updated = uc.execute(&admin(), user.user_id, true).await.unwrap();
        assert!(updated.is_active);
    }

    #[tokio::test]
    async fn test_non_admin_forbidden() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let user = register(&repo, &services(), "reader").await;
        let actor = CurrentUser::from(&user);

        assert!(matches!(
            SetActiveUseCase::new(repo).execute(&actor, user.user_id, false).await,
            Err(AuthError::AdminRequired)
        ));
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let repo = Arc::new(InMemoryUserRepository::new());
        assert!(matches!(
            SetActiveUseCase::new(repo).execute(&admin(), UserId::new(), true).await,
            Err(AuthError::UserNotFound)
        ));
    }
}

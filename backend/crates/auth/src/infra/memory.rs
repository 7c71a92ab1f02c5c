//! In-memory Repository Implementation
//!
//! Used when no database is configured and by the HTTP tests.

use std::collections::HashMap;
use std::sync::Arc;

use kernel::id::UserId;
use platform::password::HashedPassword;
use tokio::sync::RwLock;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{AuthError, AuthResult};

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;

        // Checked under the write lock, mirroring the table's unique keys
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }
        if users
            .values()
            .any(|u| u.user_name.canonical() == user.user_name.canonical())
        {
            return Err(AuthError::UserNameTaken);
        }

        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.user_name.canonical() == user_name.canonical())
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.users.read().await.values().any(|u| &u.email == email))
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        Ok(self.find_by_user_name(user_name).await?.is_some())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.user_id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }

    async fn update_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &HashedPassword,
    ) -> AuthResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(user_id).ok_or(AuthError::UserNotFound)?;
        user.set_password_hash(password_hash.clone());
        Ok(())
    }
}

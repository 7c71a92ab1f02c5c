//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::UserId;
use platform::password::HashedPassword;

use crate::domain::entity::user::User;
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    ///
    /// A uniqueness race lost against a concurrent registration surfaces as
    /// `EmailTaken` / `UserNameTaken`.
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by canonical user name
    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool>;

    /// Persist mutable fields (role, activity flag, password hash)
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Replace only the stored hash; role and activity flag are left as
    /// they are in storage
    async fn update_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &HashedPassword,
    ) -> AuthResult<()>;
}

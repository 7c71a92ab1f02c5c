//! User Entity

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::HashedPassword;

use crate::domain::value_object::{email::Email, user_name::UserName, user_role::UserRole};

/// Registered account
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique, lower-cased
    pub email: Email,
    /// Unique by canonical form
    pub user_name: UserName,
    pub password_hash: HashedPassword,
    pub user_role: UserRole,
    /// Inactive accounts cannot sign in or use existing tokens
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user
    pub fn new(
        email: Email,
        user_name: UserName,
        password_hash: HashedPassword,
        user_role: UserRole,
    ) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email,
            user_name,
            password_hash,
            user_role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user_role.is_admin()
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.updated_at = Utc::now();
    }

    /// Replace the stored hash (parameter upgrade on login)
    pub fn set_password_hash(&mut self, password_hash: HashedPassword) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }
}

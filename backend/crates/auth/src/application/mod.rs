//! Application Layer
//!
//! Use cases and application services.

pub mod authenticate;
pub mod bootstrap;
pub mod config;
pub mod login;
pub mod refresh;
pub mod register;
pub mod set_active;

// Re-exports
pub use authenticate::{AuthenticateUseCase, CurrentUser};
pub use bootstrap::{AdminSeed, BootstrapAdminUseCase};
pub use config::{AuthConfig, AuthServices};
pub use login::{LoginInput, LoginUseCase, TokenPair};
pub use refresh::RefreshUseCase;
pub use register::{RegisterInput, RegisterUseCase};
pub use set_active::SetActiveUseCase;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use super::{AuthConfig, AuthServices, RegisterInput, RegisterUseCase};
    use crate::domain::entity::user::User;
    use crate::infra::memory::InMemoryUserRepository;

    pub const STRONG_PASSWORD: &str = "Str0ng!Passw0rd";

    pub fn services() -> Arc<AuthServices> {
        Arc::new(AuthServices::from_config(&AuthConfig::development()).unwrap())
    }

    pub async fn register(
        repo: &Arc<InMemoryUserRepository>,
        services: &Arc<AuthServices>,
        user_name: &str,
    ) -> User {
        RegisterUseCase::new(repo.clone(), services.clone())
            .execute(RegisterInput {
                email: format!("{user_name}@example.com"),
                user_name: user_name.to_string(),
                password: STRONG_PASSWORD.to_string(),
            })
            .await
            .unwrap()
    }
}

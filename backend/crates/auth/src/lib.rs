//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases and the credential services
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - HTTP handlers, DTOs, router, bearer middleware
//!
//! ## Features
//! - Registration with email, user name and a policy-checked password
//! - Login issuing an access/refresh token pair
//! - Refresh rotation, stateless logout
//! - Admin activation and deactivation of accounts
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional application pepper
//! - Unknown user names and wrong passwords are indistinguishable, in
//!   message and in hashing cost
//! - Tokens are HS256 signed and typed; a refresh token never authenticates
//!   a request
//! - Inactive accounts cannot log in, refresh or use outstanding tokens

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::{AdminSeed, AuthConfig, AuthServices, CurrentUser};
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryUserRepository, PgUserRepository};
pub use presentation::{AuthAppState, auth_router, require_auth};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

//! Application Configuration
//!
//! Configuration for the Auth application layer, and the credential
//! services built from it once at startup.

use std::fmt;
use std::sync::Arc;

use platform::password::{ClearTextPassword, CredentialHasher, HashedPassword, HasherConfig};
use platform::token::{TokenCodec, TokenConfig};

use crate::error::{AuthError, AuthResult};

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Argon2id cost parameters
    pub hasher: HasherConfig,
    /// Token signing secret and lifetimes
    pub token: TokenConfig,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl AuthConfig {
    pub fn new(token: TokenConfig) -> Self {
        Self {
            hasher: HasherConfig::default(),
            token,
            password_pepper: None,
        }
    }

    /// Random signing secret and minimal hashing cost (development and tests)
    pub fn development() -> Self {
        Self {
            hasher: HasherConfig::low_cost(),
            ..Self::new(TokenConfig::with_random_secret())
        }
    }

    pub fn with_hasher(mut self, hasher: HasherConfig) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_pepper(mut self, pepper: impl Into<Vec<u8>>) -> Self {
        self.password_pepper = Some(pepper.into());
        self
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("hasher", &self.hasher)
            .field("token", &self.token)
            .field(
                "password_pepper",
                &self.password_pepper.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Credential hasher and token codec shared by every use case
#[derive(Debug)]
pub struct AuthServices {
    pub hasher: CredentialHasher,
    pub tokens: TokenCodec,
    /// Hash verified against when the user name is unknown, so a miss costs
    /// the same as a wrong password
    dummy_hash: HashedPassword,
}

impl AuthServices {
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        let hasher = CredentialHasher::new(config.hasher, config.password_pepper.clone())
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let filler = ClearTextPassword::for_verification(platform::crypto::random_token(24));
        let dummy_hash = hasher
            .hash(&filler)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(Self {
            hasher,
            tokens: TokenCodec::new(&config.token),
            dummy_hash,
        })
    }

    /// Hash on the blocking pool
    pub async fn hash_password(
        &self,
        password: Arc<ClearTextPassword>,
    ) -> AuthResult<HashedPassword> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Verify on the blocking pool; `None` verifies against the dummy hash
    /// and always yields `false`
    pub async fn verify_password(
        &self,
        password: Arc<ClearTextPassword>,
        hashed: Option<HashedPassword>,
    ) -> AuthResult<bool> {
        let hasher = self.hasher.clone();
        let known = hashed.is_some();
        let target = hashed.unwrap_or_else(|| self.dummy_hash.clone());

        let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &target))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(known && matched)
    }
}

//! Password Hashing and Policy
//!
//! - Argon2id hashing with configurable cost ([`HasherConfig`])
//! - Password policy enforced at the input boundary ([`ClearTextPassword::new`])
//! - Zeroization of clear text on drop
//! - Optional pepper appended before hashing
//!
//! Verification delegates to `argon2`, which compares digests in constant
//! time. Hashes are never compared by string equality.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Maximum password length in characters
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Characters accepted as "symbol"
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:'\",.<>/?\\|`~";

// ============================================================================
// Error Types
// ============================================================================

/// A single password policy rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyRule {
    MinLength,
    MaxLength,
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
    NoControlCharacters,
}

impl PolicyRule {
    /// Human readable rule description
    pub const fn message(&self) -> &'static str {
        match self {
            PolicyRule::MinLength => "Password must be at least 12 characters long",
            PolicyRule::MaxLength => "Password must be at most 128 characters long",
            PolicyRule::Uppercase => "Password must contain at least one uppercase letter",
            PolicyRule::Lowercase => "Password must contain at least one lowercase letter",
            PolicyRule::Digit => "Password must contain at least one digit",
            PolicyRule::Symbol => "Password must contain at least one special character",
            PolicyRule::NoControlCharacters => "Password contains invalid control characters",
        }
    }

    /// Stable machine readable code
    pub const fn code(&self) -> &'static str {
        match self {
            PolicyRule::MinLength => "min_length",
            PolicyRule::MaxLength => "max_length",
            PolicyRule::Uppercase => "uppercase",
            PolicyRule::Lowercase => "lowercase",
            PolicyRule::Digit => "digit",
            PolicyRule::Symbol => "symbol",
            PolicyRule::NoControlCharacters => "no_control_characters",
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Password policy violation, listing every rule that failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Password does not meet requirements: {}", join_messages(.violations))]
pub struct PasswordPolicyError {
    violations: Vec<PolicyRule>,
}

impl PasswordPolicyError {
    pub fn violations(&self) -> &[PolicyRule] {
        &self.violations
    }
}

fn join_messages(rules: &[PolicyRule]) -> String {
    rules
        .iter()
        .map(PolicyRule::message)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Argon2 parameters rejected
    #[error("Invalid hasher parameters: {0}")]
    InvalidParams(String),

    /// Invalid hash format
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Policy
// ============================================================================

/// Check `password` against every rule; returns all failures.
///
/// Length is counted in Unicode scalar values after NFKC normalization.
pub fn validate_policy(password: &str) -> Result<(), PasswordPolicyError> {
    let normalized: Zeroizing<String> = Zeroizing::new(password.nfkc().collect());
    let mut violations = Vec::new();

    let char_count = normalized.chars().count();
    if char_count < MIN_PASSWORD_LENGTH {
        violations.push(PolicyRule::MinLength);
    }
    if char_count > MAX_PASSWORD_LENGTH {
        violations.push(PolicyRule::MaxLength);
    }
    if !normalized.chars().any(char::is_uppercase) {
        violations.push(PolicyRule::Uppercase);
    }
    if !normalized.chars().any(char::is_lowercase) {
        violations.push(PolicyRule::Lowercase);
    }
    if !normalized.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PolicyRule::Digit);
    }
    if !normalized.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        violations.push(PolicyRule::Symbol);
    }
    if normalized.chars().any(char::is_control) {
        violations.push(PolicyRule::NoControlCharacters);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(PasswordPolicyError { violations })
    }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Not `Clone`; debug output is redacted.
///
/// ## Examples
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// assert!(ClearTextPassword::new("Str0ng!Passw0rd".to_string()).is_ok());
/// assert!(ClearTextPassword::new("password123".to_string()).is_err());
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a new clear text password, enforcing the policy
    ///
    /// Unicode is normalized using NFKC before validation.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let raw = Zeroizing::new(raw);
        validate_policy(&raw)?;
        Ok(Self(raw.nfkc().collect()))
    }

    /// Wrap a password presented at login
    ///
    /// No policy is applied: accounts created under an older policy must
    /// still be able to sign in.
    pub fn for_verification(raw: String) -> Self {
        let raw = Zeroizing::new(raw);
        Self(raw.nfkc().collect())
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Password bytes followed by the pepper, wiped after use
    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut combined = Zeroizing::new(self.as_bytes().to_vec());
        if let Some(p) = pepper {
            combined.extend_from_slice(p);
        }
        combined
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Credential Hasher
// ============================================================================

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HasherConfig {
    /// OWASP recommended: m=19456 (19 MiB), t=2, p=1
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl HasherConfig {
    /// Minimal cost for tests and local development
    pub fn low_cost() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// One-way credential hasher
///
/// ## Examples
/// ```rust
/// use platform::password::{ClearTextPassword, CredentialHasher, HasherConfig};
///
/// let hasher = CredentialHasher::new(HasherConfig::low_cost(), None).unwrap();
/// let password = ClearTextPassword::new("Str0ng!Passw0rd".to_string()).unwrap();
/// let hashed = hasher.hash(&password).unwrap();
/// assert!(hasher.verify(&password, &hashed));
/// ```
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
    pepper: Option<Zeroizing<Vec<u8>>>,
}

impl CredentialHasher {
    pub fn new(config: HasherConfig, pepper: Option<Vec<u8>>) -> Result<Self, PasswordHashError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;
        Ok(Self {
            params,
            pepper: pepper.filter(|p| !p.is_empty()).map(Zeroizing::new),
        })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn pepper(&self) -> Option<&[u8]> {
        self.pepper.as_deref().map(Vec::as_slice)
    }

    /// Hash with a fresh 128-bit random salt
    pub fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        let bytes = password.peppered(self.pepper());
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(&bytes, &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }

    /// Verify a password against a stored hash
    ///
    /// Parameters embedded in the PHC string take precedence over this
    /// hasher's configuration, so hashes made under older costs still verify.
    pub fn verify(&self, password: &ClearTextPassword, hashed: &HashedPassword) -> bool {
        let Ok(parsed) = PasswordHash::new(&hashed.hash) else {
            return false;
        };
        let bytes = password.peppered(self.pepper());
        self.argon2().verify_password(&bytes, &parsed).is_ok()
    }

    /// Whether `hashed` was produced with different parameters than ours
    pub fn needs_rehash(&self, hashed: &HashedPassword) -> bool {
        let Ok(parsed) = PasswordHash::new(&hashed.hash) else {
            return true;
        };
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }
        match Params::try_from(&parsed) {
            Ok(params) => {
                params.m_cost() != self.params.m_cost()
                    || params.t_cost() != self.params.t_cost()
                    || params.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}

impl fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

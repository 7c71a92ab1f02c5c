//! User Name Value Object
//!
//! The public handle used to sign in.
//!
//! ## Rules
//! - NFKC normalized and trimmed, then validated
//! - ASCII only: `a-z`, `0-9`, `_ . - +` (upper case accepted, canonical form is lower case)
//! - Length 3..=100 characters
//! - Starts and ends with a letter, digit or `_`
//! - No `..`, no whitespace
//! - Not a reserved word (self-registration only)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

pub const USER_NAME_MIN_LENGTH: usize = 3;
pub const USER_NAME_MAX_LENGTH: usize = 100;

const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-', '+'];

/// Names that cannot be claimed through self-registration
const DEFAULT_RESERVED_WORDS: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "superuser",
    "support",
    "api",
    "auth",
    "login",
    "logout",
    "register",
    "refresh",
    "me",
    "null",
    "undefined",
    "anonymous",
];

/// Error returned when user name validation fails
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserNameError {
    #[error("Username cannot be empty")]
    Empty,

    #[error("Username is too short ({length} chars, minimum {min})")]
    TooShort { length: usize, min: usize },

    #[error("Username is too long ({length} chars, maximum {max})")]
    TooLong { length: usize, max: usize },

    #[error("Invalid character '{char}' at position {position}. Only a-z, 0-9, _, ., -, + are allowed")]
    InvalidCharacter { char: char, position: usize },

    #[error("Username must start and end with a-z, 0-9, or _")]
    InvalidBoundary,

    #[error("Username cannot contain consecutive dots (..)")]
    ConsecutiveDots,

    #[error("Username cannot contain whitespace")]
    ContainsWhitespace,

    #[error("'{word}' is a reserved username")]
    Reserved { word: String },
}

/// Validated, normalized user name
///
/// `original` keeps the user's casing for display; `canonical` is the
/// lower-case form used for uniqueness and lookup.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName {
    original: String,
    canonical: String,
}

impl UserName {
    /// Validate a self-registered name (reserved words rejected)
    pub fn new(input: impl AsRef<str>) -> Result<Self, UserNameError> {
        Self::new_with_reserved(input, DEFAULT_RESERVED_WORDS)
    }

    /// Validate against a custom reserved list (empty for operator-created accounts)
    pub fn new_with_reserved(
        input: impl AsRef<str>,
        reserved_words: &[&str],
    ) -> Result<Self, UserNameError> {
        let original = Self::normalize_original(input.as_ref());
        let canonical = original.to_lowercase();
        Self::validate(&canonical, reserved_words)?;
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Normalize a login identifier without validating it
    ///
    /// Lookups must not leak which rule a bad identifier broke.
    pub fn for_lookup(input: impl AsRef<str>) -> Self {
        let original = Self::normalize_original(input.as_ref());
        let canonical = original.to_lowercase();
        Self {
            original,
            canonical,
        }
    }

    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Create from database values (assumes already validated)
    pub fn from_db(original: &str) -> Self {
        Self {
            original: original.to_string(),
            canonical: original.to_lowercase(),
        }
    }

    fn normalize_original(input: &str) -> String {
        input.nfkc().collect::<String>().trim().to_string()
    }

    fn validate(canonical: &str, reserved_words: &[&str]) -> Result<(), UserNameError> {
        if canonical.is_empty() {
            return Err(UserNameError::Empty);
        }

        let length = canonical.chars().count();
        if length < USER_NAME_MIN_LENGTH {
            return Err(UserNameError::TooShort {
                length,
                min: USER_NAME_MIN_LENGTH,
            });
        }
        if length > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong {
                length,
                max: USER_NAME_MAX_LENGTH,
            });
        }

        if canonical.chars().any(char::is_whitespace) {
            return Err(UserNameError::ContainsWhitespace);
        }

        if let Some((position, char)) = canonical
            .chars()
            .enumerate()
            .find(|(_, c)| !Self::is_valid_char(*c))
        {
            return Err(UserNameError::InvalidCharacter { char, position });
        }

        let boundary_ok = canonical.chars().next().is_some_and(Self::is_valid_boundary)
            && canonical.chars().next_back().is_some_and(Self::is_valid_boundary);
        if !boundary_ok {
            return Err(UserNameError::InvalidBoundary);
        }

        if canonical.contains("..") {
            return Err(UserNameError::ConsecutiveDots);
        }

        if reserved_words.contains(&canonical) {
            return Err(UserNameError::Reserved {
                word: canonical.to_string(),
            });
        }

        Ok(())
    }

    #[inline]
    fn is_valid_char(c: char) -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || ALLOWED_SPECIAL_CHARS.contains(&c)
    }

    #[inline]
    fn is_valid_boundary(c: char) -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserName")
            .field("original", &self.original)
            .field("canonical", &self.canonical)
            .finish()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.original
    }
}

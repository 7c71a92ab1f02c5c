//! Sensitive data masking
//!
//! Scrubs e-mail addresses, credentials, card numbers and phone numbers from
//! free text before it is written to a response body or a log line.
//! Substitutions run in a fixed order; later patterns see the output of
//! earlier ones.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

static PASSWORD_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(password|passwd|pwd)\s*[:=]\s*[^\s]+").unwrap());

static SECRET_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(secret|token|key|api_key)\s*[:=]\s*[^\s]+").unwrap());

static CARD_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b").unwrap()
});

static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap());

pub const EMAIL_MASK: &str = "***@***.***";
pub const CARD_MASK: &str = "****-****-****-****";
pub const PHONE_MASK: &str = "***-***-****";

/// Mask sensitive substrings in `input`.
///
/// ## Examples
/// ```rust
/// use kernel::error::mask::mask_sensitive;
///
/// assert_eq!(mask_sensitive("password=hunter2"), "password=***");
/// assert!(!mask_sensitive("contact me at a@b.com").contains("@b.com"));
/// ```
pub fn mask_sensitive(input: &str) -> String {
    let masked = EMAIL.replace_all(input, EMAIL_MASK);
    let masked = PASSWORD_PAIR.replace_all(&masked, "${1}=***");
    let masked = SECRET_PAIR.replace_all(&masked, "${1}=***");
    let masked = CARD_NUMBER.replace_all(&masked, CARD_MASK);
    let masked = PHONE_NUMBER.replace_all(&masked, PHONE_MASK);
    masked.into_owned()
}

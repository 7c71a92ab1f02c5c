//! Bearer Token Codec
//!
//! Stateless HS256 JWTs carrying `{sub, type, exp, iat}`. Access and
//! refresh tokens share one structure and differ only in `type`; the codec
//! decodes both and leaves the kind check to the caller.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

/// Default access token lifetime (minutes)
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 30;

/// Default refresh token lifetime (days)
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// Token kind claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
}

/// Decode failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is malformed")]
    Malformed,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// Codec configuration
#[derive(Clone)]
pub struct TokenConfig {
    secret: Zeroizing<Vec<u8>>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
        }
    }

    /// Random 64-byte secret (tokens do not survive a restart)
    pub fn with_random_secret() -> Self {
        Self::new(crate::crypto::random_bytes(64))
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Issues and validates signed bearer tokens
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(&config.secret),
            decoding: DecodingKey::from_secret(&config.secret),
            validation,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    pub fn issue_access(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, TokenKind::Access, self.access_ttl)
    }

    pub fn issue_refresh(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, TokenKind::Refresh, self.refresh_ttl)
    }

    /// Issue a token with an explicit lifetime (negative yields an expired token)
    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            kind,
            exp: now
                .checked_add_signed(ttl)
                .ok_or_else(|| TokenError::Encoding("token lifetime out of range".into()))?
                .timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }

    /// Decode and require a specific kind
    ///
    /// A token of the other kind is reported as [`TokenError::Malformed`].
    pub fn decode_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.kind != expected {
            return Err(TokenError::Malformed);
        }
        Ok(claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&TokenConfig::new("test-secret-key-for-tokens"))
    }

    #[test]
    fn test_access_roundtrip() {
        let codec = codec();
        let token = codec.issue_access("user-1").unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_roundtrip() {
        let codec = codec();
        let token = codec.issue_refresh("user-2").unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.sub, "user-2");
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert!(claims.exp - claims.iat >= Duration::days(7).num_seconds());
    }

    #[test]
    fn test_kind_is_serialized_as_type() {
        let claims = Claims {
            sub: "s".into(),
            kind: TokenKind::Refresh,
            exp: 1,
            iat: 0,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "refresh");
    }

    #[test]
    fn test_expired_token_reports_expired() {
        let codec = codec();
        let token = codec
            .issue("user-1", TokenKind::Access, Duration::seconds(-60))
            .unwrap();
        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let ttl = Duration::try_days(100_000_000_000).unwrap();
        assert!(matches!(
            codec().issue("user-1", TokenKind::Access, ttl),
            Err(TokenError::Encoding(_))
        ));
    }

    #[test]
    fn test_wrong_secret_reports_invalid_signature() {
        let token = codec().issue_access("user-1").unwrap();
        let other = TokenCodec::new(&TokenConfig::new("a-different-secret"));
        assert_eq!(other.decode(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_reports_malformed() {
        let codec = codec();
        assert_eq!(codec.decode("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(codec.decode(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_decode_kind_rejects_other_kind() {
        let codec = codec();
        let access = codec.issue_access("user-1").unwrap();
        assert!(codec.decode_kind(&access, TokenKind::Access).is_ok());
        assert_eq!(
            codec.decode_kind(&access, TokenKind::Refresh),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let config = TokenConfig::new("super-secret-value");
        assert!(!format!("{:?}", config).contains("super-secret-value"));
    }
}

//! Application configuration
//!
//! Read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};
use auth::{AdminSeed, AuthConfig};
use chrono::{Duration, Utc};
use platform::crypto::from_base64;
use platform::token::TokenConfig;
use platform::upload::UploadConfig;
use reading::ReadingConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5_000_000;
const DEFAULT_ACCESS_TTL_MINUTES: i64 = 30;
const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

#[derive(Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` runs on the in-memory store
    pub database_url: Option<String>,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
    pub reading: ReadingConfig,
    pub admin: Option<AdminSeed>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let frontend_origins = get("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let token = match get("JWT_SECRET") {
            Some(secret) => TokenConfig::new(secret.into_bytes()),
            None if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using a random secret");
                TokenConfig::with_random_secret()
            }
            None => bail!("JWT_SECRET must be set in production"),
        }
        .with_access_ttl(lifetime(
            &get,
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            DEFAULT_ACCESS_TTL_MINUTES,
            Duration::try_minutes,
        )?)
        .with_refresh_ttl(lifetime(
            &get,
            "REFRESH_TOKEN_EXPIRE_DAYS",
            DEFAULT_REFRESH_TTL_DAYS,
            Duration::try_days,
        )?);

        let mut auth = AuthConfig::new(token);
        if let Some(pepper) = get("PASSWORD_PEPPER") {
            // Base64 when it decodes, raw bytes otherwise
            let bytes = from_base64(&pepper).unwrap_or_else(|_| pepper.into_bytes());
            auth = auth.with_pepper(bytes);
        }

        let upload_dir = PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into()));
        let upload_dir = std::path::absolute(&upload_dir)
            .with_context(|| format!("UPLOAD_DIR {} cannot be made absolute", upload_dir.display()))?;
        let upload = UploadConfig::new(upload_dir).with_max_bytes(parse_or(
            &get,
            "MAX_UPLOAD_BYTES",
            DEFAULT_MAX_UPLOAD_BYTES,
        )?);

        let defaults = ReadingConfig::default();
        let reading = ReadingConfig::new(
            parse_or(&get, "DEFAULT_PAGE_LIMIT", defaults.default_limit)?,
            parse_or(&get, "MAX_PAGE_LIMIT", defaults.max_limit)?,
        );

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_USERNAME"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(user_name), Some(password)) => Some(AdminSeed {
                email,
                user_name,
                password,
            }),
            (None, None, None) => None,
            _ => bail!("ADMIN_EMAIL, ADMIN_USERNAME and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            frontend_origins,
            auth,
            upload,
            reading,
            admin,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value")),
        None => Ok(default),
    }
}

/// Positive token lifetime in `unit`s that still yields a representable expiry
fn lifetime<G>(
    get: &G,
    key: &str,
    default: i64,
    unit: fn(i64) -> Option<Duration>,
) -> anyhow::Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    let amount: i64 = parse_or(get, key, default)?;
    if amount <= 0 {
        bail!("{key} must be greater than 0");
    }
    unit(amount)
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .with_context(|| format!("{key} is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("JWT_SECRET", "test-secret")]).unwrap();
        assert_eq!(config.bind_addr.port(), 31113);
        assert!(config.database_url.is_none());
        assert_eq!(config.frontend_origins.len(), 2);
        assert_eq!(config.upload.max_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.upload.root.is_absolute());
        assert_eq!(config.reading, ReadingConfig::default());
        assert_eq!(config.auth.token.access_ttl, Duration::minutes(30));
        assert_eq!(config.auth.token.refresh_ttl, Duration::days(7));
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("JWT_SECRET", "test-secret"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/reading"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
            ("MAX_UPLOAD_BYTES", "1024"),
            ("DEFAULT_PAGE_LIMIT", "20"),
            ("MAX_PAGE_LIMIT", "40"),
            ("PASSWORD_PEPPER", "cGVwcGVy"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.database_url.is_some());
        assert_eq!(config.auth.token.access_ttl, Duration::minutes(5));
        assert_eq!(config.upload.max_bytes, 1024);
        assert_eq!(config.reading, ReadingConfig::new(20, 40));
        assert_eq!(config.auth.password_pepper.as_deref(), Some(&b"pepper"[..]));
    }

    #[test]
    fn test_invalid_number_rejected() {
        assert!(config(&[("JWT_SECRET", "s"), ("MAX_PAGE_LIMIT", "many")]).is_err());
    }

    #[test]
    fn test_token_lifetimes_must_be_positive_and_bounded() {
        for (key, value) in [
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "0"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "-5"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "9223372036854775807"),
            ("REFRESH_TOKEN_EXPIRE_DAYS", "0"),
            ("REFRESH_TOKEN_EXPIRE_DAYS", "106751991167300"),
        ] {
            let err = config(&[("JWT_SECRET", "s"), (key, value)]).unwrap_err();
            assert!(err.to_string().contains(key), "{key}={value}: {err}");
        }

        let config = config(&[("JWT_SECRET", "s"), ("REFRESH_TOKEN_EXPIRE_DAYS", "30")]).unwrap();
        assert_eq!(config.auth.token.refresh_ttl, Duration::days(30));
    }

    #[test]
    fn test_partial_admin_seed_rejected() {
        assert!(config(&[("JWT_SECRET", "s"), ("ADMIN_USERNAME", "admin")]).is_err());

        let config = config(&[
            ("JWT_SECRET", "s"),
            ("ADMIN_EMAIL", "admin@example.com"),
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "Adm1n!Passw0rd"),
        ])
        .unwrap();
        assert_eq!(config.admin.unwrap().user_name, "admin");
    }
}

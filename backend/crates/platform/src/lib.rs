//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Credential hashing and password policy (Argon2id)
//! - Bearer token codec (HS256 JWT)
//! - URL safety guard and SSRF-safe outbound HTTP client
//! - Sandboxed image upload storage
//! - Request header helpers and random token generation

pub mod client;
pub mod crypto;
pub mod http_client;
pub mod password;
pub mod token;
pub mod upload;
pub mod url_guard;

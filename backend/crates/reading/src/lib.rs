//! Reading Backend Module
//!
//! Reading-list entries owned by users:
//! - `domain/` - Entry entity, validated fields, repository trait
//! - `application/` - Use cases and paging config
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! Links pass the https-only URL guard. Cover images go through the
//! sandboxed upload store, one directory per owner.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

pub use application::ReadingConfig;
pub use error::{ReadingError, ReadingResult};
pub use infra::{InMemoryEntryRepository, PgEntryRepository};
pub use presentation::{ReadingAppState, reading_router};

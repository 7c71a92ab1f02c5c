//! Application Layer
//!
//! Entry use cases. Every operation takes the acting [`Actor`] so
//! ownership is checked in one place.
//!
//! [`Actor`]: crate::domain::value_objects::Actor

pub mod config;
pub mod cover_image;
pub mod create_entry;
pub mod delete_entry;
pub mod get_entry;
pub mod list_entries;
pub mod update_entry;

pub use config::ReadingConfig;
pub use cover_image::{RemoveCoverUseCase, SetCoverUseCase};
pub use create_entry::{CreateEntryInput, CreateEntryUseCase};
pub use delete_entry::DeleteEntryUseCase;
pub use get_entry::GetEntryUseCase;
pub use list_entries::{EntryPage, ListEntriesInput, ListEntriesUseCase};
pub use update_entry::{UpdateEntryInput, UpdateEntryUseCase};

//! Repository Traits

use kernel::id::{EntryId, UserId};

use super::entities::Entry;
use super::value_objects::{EntryStatus, Page};
use crate::error::ReadingResult;

/// Listing filter; `None` fields do not restrict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub owner: Option<UserId>,
    pub status: Option<EntryStatus>,
}

/// Entry persistence
///
/// Listings are ordered by `created_at` descending.
#[trait_variant::make(EntryRepository: Send)]
pub trait LocalEntryRepository {
    async fn create(&self, entry: &Entry) -> ReadingResult<()>;

    async fn find_by_id(&self, entry_id: &EntryId) -> ReadingResult<Option<Entry>>;

    /// Returns the page and the total number of matches
    async fn list(&self, filter: EntryFilter, page: Page) -> ReadingResult<(Vec<Entry>, u64)>;

    async fn update(&self, entry: &Entry) -> ReadingResult<()>;

    /// `false` when nothing was deleted
    async fn delete(&self, entry_id: &EntryId) -> ReadingResult<bool>;
}

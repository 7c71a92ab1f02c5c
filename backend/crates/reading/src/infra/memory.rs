//! In-memory Repository Implementation

use std::sync::Arc;

use kernel::id::EntryId;
use tokio::sync::RwLock;

use crate::domain::entities::Entry;
use crate::domain::repository::{EntryFilter, EntryRepository};
use crate::domain::value_objects::Page;
use crate::error::{ReadingError, ReadingResult};

/// Entries kept in insertion order
#[derive(Clone, Default)]
pub struct InMemoryEntryRepository {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl InMemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(entry: &Entry, filter: &EntryFilter) -> bool {
    filter.owner.is_none_or(|owner| entry.owner_id == owner)
        && filter.status.is_none_or(|status| entry.status == status)
}

impl EntryRepository for InMemoryEntryRepository {
    async fn create(&self, entry: &Entry) -> ReadingResult<()> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.entry_id == entry.entry_id) {
            return Err(ReadingError::Internal(format!(
                "Duplicate entry id {}",
                entry.entry_id
            )));
        }
        entries.push(entry.clone());
        Ok(())
    }

    async fn find_by_id(&self, entry_id: &EntryId) -> ReadingResult<Option<Entry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|e| &e.entry_id == entry_id)
            .cloned())
    }

    async fn list(&self, filter: EntryFilter, page: Page) -> ReadingResult<(Vec<Entry>, u64)> {
        let entries = self.entries.read().await;

        // Newest insert first; the stable sort keeps that order for equal timestamps
        let mut matching: Vec<&Entry> = entries
            .iter()
            .rev()
            .filter(|e| matches(e, &filter))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn update(&self, entry: &Entry) -> ReadingResult<()> {
        let mut entries = self.entries.write().await;
        let slot = entries
            .iter_mut()
            .find(|e| e.entry_id == entry.entry_id)
            .ok_or(ReadingError::EntryNotFound)?;
        *slot = entry.clone();
        Ok(())
    }

    async fn delete(&self, entry_id: &EntryId) -> ReadingResult<bool> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| &e.entry_id != entry_id);
        Ok(entries.len() != before)
    }
}

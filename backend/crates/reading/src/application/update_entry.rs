//! Update Entry Use Case
//!
//! Partial update: only provided fields change.

use std::sync::Arc;

use kernel::id::EntryId;

use crate::application::get_entry::load_authorized;
use crate::domain::entities::{Entry, EntryPatch};
use crate::domain::repository::EntryRepository;
use crate::domain::value_objects::{Actor, Description, EntryKind, EntryStatus, Link, Title};
use crate::error::ReadingResult;

#[derive(Debug, Clone, Default)]
pub struct UpdateEntryInput {
    pub title: Option<String>,
    pub kind: Option<EntryKind>,
    pub link: Option<String>,
    pub status: Option<EntryStatus>,
    pub description: Option<String>,
}

impl UpdateEntryInput {
    fn into_patch(self) -> ReadingResult<EntryPatch> {
        Ok(EntryPatch {
            title: self.title.as_deref().map(Title::new).transpose()?,
            kind: self.kind,
            link: self.link.as_deref().map(Link::new).transpose()?,
            status: self.status,
            description: self.description.map(Description::new).transpose()?,
        })
    }
}

pub struct UpdateEntryUseCase<R>
where
    R: EntryRepository,
{
    repo: Arc<R>,
}

impl<R> UpdateEntryUseCase<R>
where
    R: EntryRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        entry_id: &EntryId,
        input: UpdateEntryInput,
    ) -> ReadingResult<Entry> {
        let mut entry = load_authorized(self.repo.as_ref(), actor, entry_id).await?;

        let patch = input.into_patch()?;
        if patch.is_empty() {
            return Ok(entry);
        }

        entry.apply(patch);
        self.repo.update(&entry).await?;

        tracing::info!(entry_id = %entry.entry_id, actor = %actor.user_id, "Entry updated");

        Ok(entry)
    }
}

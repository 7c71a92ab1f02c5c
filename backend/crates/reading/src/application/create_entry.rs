//! Create Entry Use Case

use std::sync::Arc;

use crate::domain::entities::Entry;
use crate::domain::repository::EntryRepository;
use crate::domain::value_objects::{Actor, Description, EntryKind, EntryStatus, Link, Title};
use crate::error::ReadingResult;

#[derive(Debug, Clone)]
pub struct CreateEntryInput {
    pub title: String,
    pub kind: EntryKind,
    pub link: Option<String>,
    pub status: Option<EntryStatus>,
    pub description: Option<String>,
}

pub struct CreateEntryUseCase<R>
where
    R: EntryRepository,
{
    repo: Arc<R>,
}

impl<R> CreateEntryUseCase<R>
where
    R: EntryRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// The entry is always owned by `actor`
    pub async fn execute(&self, actor: &Actor, input: CreateEntryInput) -> ReadingResult<Entry> {
        let title = Title::new(&input.title)?;
        let link = input.link.as_deref().map(Link::new).transpose()?;
        let description = input.description.map(Description::new).transpose()?;

        let entry = Entry::new(
            actor.user_id,
            title,
            input.kind,
            link,
            input.status,
            description,
        );
        self.repo.create(&entry).await?;

        tracing::info!(
            entry_id = %entry.entry_id,
            owner_id = %entry.owner_id,
            kind = %entry.kind,
            "Entry created"
        );

        Ok(entry)
    }
}

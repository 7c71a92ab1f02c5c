//! Delete Entry Use Case

use std::sync::Arc;

use kernel::id::EntryId;
use platform::upload::UploadStore;

use crate::application::get_entry::load_authorized;
use crate::domain::repository::EntryRepository;
use crate::domain::value_objects::Actor;
use crate::error::{ReadingError, ReadingResult};

pub struct DeleteEntryUseCase<R>
where
    R: EntryRepository,
{
    repo: Arc<R>,
    uploads: Arc<UploadStore>,
}

impl<R> DeleteEntryUseCase<R>
where
    R: EntryRepository,
{
    pub fn new(repo: Arc<R>, uploads: Arc<UploadStore>) -> Self {
        Self { repo, uploads }
    }

    /// Deletes the entry and then its cover image, if any
    pub async fn execute(&self, actor: &Actor, entry_id: &EntryId) -> ReadingResult<()> {
        let entry = load_authorized(self.repo.as_ref(), actor, entry_id).await?;

        if !self.repo.delete(&entry.entry_id).await? {
            return Err(ReadingError::EntryNotFound);
        }

        if let Some(cover) = entry.cover_image {
            let uploads = self.uploads.clone();
            tokio::task::spawn_blocking(move || uploads.delete(cover)).await?;
        }

        tracing::info!(entry_id = %entry.entry_id, actor = %actor.user_id, "Entry deleted");

        Ok(())
    }
}

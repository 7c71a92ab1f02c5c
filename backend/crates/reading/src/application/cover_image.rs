//! Cover Image Use Cases
//!
//! Covers are stored by the upload pipeline under a directory named after
//! the entry owner; the entry keeps the path relative to the upload root.

use std::sync::Arc;

use axum::body::Bytes;
use kernel::id::EntryId;
use platform::upload::UploadStore;

use crate::application::get_entry::load_authorized;
use crate::domain::entities::Entry;
use crate::domain::repository::EntryRepository;
use crate::domain::value_objects::Actor;
use crate::error::ReadingResult;

/// Delete a stored file off the async runtime; failures are only logged
async fn discard(uploads: &Arc<UploadStore>, path: String) {
    let uploads = uploads.clone();
    if let Err(err) = tokio::task::spawn_blocking(move || uploads.delete(path)).await {
        tracing::error!(error = %err, "Cover cleanup task failed");
    }
}

pub struct SetCoverUseCase<R>
where
    R: EntryRepository,
{
    repo: Arc<R>,
    uploads: Arc<UploadStore>,
}

impl<R> SetCoverUseCase<R>
where
    R: EntryRepository,
{
    pub fn new(repo: Arc<R>, uploads: Arc<UploadStore>) -> Self {
        Self { repo, uploads }
    }

    /// Store `data` as the entry's cover, replacing any previous one
    pub async fn execute(&self, actor: &Actor, entry_id: &EntryId, data: Bytes) -> ReadingResult<Entry> {
        let mut entry = load_authorized(self.repo.as_ref(), actor, entry_id).await?;

        let uploads = self.uploads.clone();
        let scope = entry.owner_id.to_string();
        let stored = tokio::task::spawn_blocking(move || uploads.store_scoped(&scope, &data)).await??;

        let previous = entry.replace_cover(Some(stored.relative_path.clone()));
        if let Err(err) = self.repo.update(&entry).await {
            discard(&self.uploads, stored.relative_path).await;
            return Err(err);
        }

        if let Some(previous) = previous {
            discard(&self.uploads, previous).await;
        }

        tracing::info!(
            entry_id = %entry.entry_id,
            file = %stored.relative_path,
            mime = stored.image_type.mime(),
            "Cover image set"
        );

        Ok(entry)
    }
}

pub struct RemoveCoverUseCase<R>
where
    R: EntryRepository,
{
    repo: Arc<R>,
    uploads: Arc<UploadStore>,
}

impl<R> RemoveCoverUseCase<R>
where
    R: EntryRepository,
{
    pub fn new(repo: Arc<R>, uploads: Arc<UploadStore>) -> Self {
        Self { repo, uploads }
    }

    /// No-op when the entry has no cover
    pub async fn execute(&self, actor: &Actor, entry_id: &EntryId) -> ReadingResult<Entry> {
        let mut entry = load_authorized(self.repo.as_ref(), actor, entry_id).await?;
        if entry.cover_image.is_none() {
            return Ok(entry);
        }

        let previous = entry.replace_cover(None);
        self.repo.update(&entry).await?;
        if let Some(previous) = previous {
            discard(&self.uploads, previous).await;
        }

        tracing::info!(entry_id = %entry.entry_id, "Cover image removed");

        Ok(entry)
    }
}

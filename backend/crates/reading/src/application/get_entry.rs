//! Get Entry Use Case

use std::sync::Arc;

use kernel::id::EntryId;

use crate::domain::entities::Entry;
use crate::domain::repository::EntryRepository;
use crate::domain::value_objects::Actor;
use crate::error::{ReadingError, ReadingResult};

/// Load an entry and check `actor` may access it
///
/// Missing entries are reported before ownership, so 404 wins over 403.
pub(crate) async fn load_authorized<R>(
    repo: &R,
    actor: &Actor,
    entry_id: &EntryId,
) -> ReadingResult<Entry>
where
    R: EntryRepository,
{
    let entry = repo
        .find_by_id(entry_id)
        .await?
        .ok_or(ReadingError::EntryNotFound)?;
    entry.ensure_accessible_by(actor)?;
    Ok(entry)
}

pub struct GetEntryUseCase<R>
where
    R: EntryRepository,
{
    repo: Arc<R>,
}

impl<R> GetEntryUseCase<R>
where
    R: EntryRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, actor: &Actor, entry_id: &EntryId) -> ReadingResult<Entry> {
        load_authorized(self.repo.as_ref(), actor, entry_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{admin, create, user};
    use crate::infra::memory::InMemoryEntryRepository;

    #[tokio::test]
    async fn test_owner_and_admin_can_read() {
        let repo = Arc::new(InMemoryEntryRepository::new());
        let owner = user();
        let entry = create(&repo, &owner, "Dune").await;
        let use_case = GetEntryUseCase::new(repo);

        assert!(use_case.execute(&owner, &entry.entry_id).await.is_ok());
        assert!(use_case.execute(&admin(), &entry.entry_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_user_forbidden() {
        let repo = Arc::new(InMemoryEntryRepository::new());
        let entry = create(&repo, &user(), "Dune").await;

        let err = GetEntryUseCase::new(repo)
            .execute(&user(), &entry.entry_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ReadingError::Forbidden));
    }

    #[tokio::test]
    async fn test_missing_entry() {
        let repo = Arc::new(InMemoryEntryRepository::new());
        let err = GetEntryUseCase::new(repo)
            .execute(&user(), &EntryId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReadingError::EntryNotFound));
    }
}

//! List Entries Use Case

use std::sync::Arc;

use crate::application::config::ReadingConfig;
use crate::domain::entities::Entry;
use crate::domain::repository::{EntryFilter, EntryRepository};
use crate::domain::value_objects::{Actor, EntryStatus, Page};
use crate::error::{ReadingError, ReadingResult};

#[derive(Debug, Clone, Default)]
pub struct ListEntriesInput {
    /// Raw status filter; empty means no filter
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct EntryPage {
    pub items: Vec<Entry>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

pub struct ListEntriesUseCase<R>
where
    R: EntryRepository,
{
    repo: Arc<R>,
    config: ReadingConfig,
}

impl<R> ListEntriesUseCase<R>
where
    R: EntryRepository,
{
    pub fn new(repo: Arc<R>, config: ReadingConfig) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, actor: &Actor, input: ListEntriesInput) -> ReadingResult<EntryPage> {
        let status = match input.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(EntryStatus::parse(raw).ok_or(ReadingError::InvalidStatusFilter)?),
        };
        let page = Page::new(
            input.limit.unwrap_or(i64::from(self.config.default_limit)),
            input.offset.unwrap_or(0),
            self.config.max_limit,
        )?;

        let filter = EntryFilter {
            owner: actor.owner_scope(),
            status,
        };
        let (items, total) = self.repo.list(filter, page).await?;

        tracing::debug!(
            actor = %actor.user_id,
            returned = items.len(),
            total,
            "Entries listed"
        );

        Ok(EntryPage {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{admin, create, user};
    use crate::infra::memory::InMemoryEntryRepository;

    fn use_case(repo: &Arc<InMemoryEntryRepository>) -> ListEntriesUseCase<InMemoryEntryRepository> {
        ListEntriesUseCase::new(repo.clone(), ReadingConfig::new(2, 10))
    }

    #[tokio::test]
    async fn test_users_see_only_their_entries() {
        let repo = Arc::new(InMemoryEntryRepository::new());
        let alice = user();
        let bob = user();
        create(&repo, &alice, "A1").await;
        create(&repo, &bob, "B1").await;

        let page = use_case(&repo)
            .execute(&alice, ListEntriesInput::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title.as_str(), "A1");

        let page = use_case(&repo)
            .execute(&admin(), ListEntriesInput::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_default_limit_and_newest_first() {
        let repo = Arc::new(InMemoryEntryRepository::new());
        let actor = user();
        for title in ["first", "second", "third"] {
            create(&repo, &actor, title).await;
        }

        let page = use_case(&repo)
            .execute(&actor, ListEntriesInput::default())
            .await
            .unwrap();
        assert_eq!(page.limit, 2);
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title.as_str(), "third");

        let page = use_case(&repo)
            .execute(
                &actor,
                ListEntriesInput {
                    offset: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title.as_str(), "first");
    }

    #[tokio::test]
    async fn test_status_filter() {
        let repo = Arc::new(InMemoryEntryRepository::new());
        let actor = user();
        let mut done = create(&repo, &actor, "done").await;
        done.status = EntryStatus::Completed;
        repo.update(&done).await.unwrap();
        create(&repo, &actor, "pending").await;

        let page = use_case(&repo)
            .execute(
                &actor,
                ListEntriesInput {
                    status: Some("completed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title.as_str(), "done");

        let page = use_case(&repo)
            .execute(
                &actor,
                ListEntriesInput {
                    status: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_invalid_parameters() {
        let repo = Arc::new(InMemoryEntryRepository::new());
        let actor = user();

        let err = use_case(&repo)
            .execute(
                &actor,
                ListEntriesInput {
                    status: Some("finished".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReadingError::InvalidStatusFilter));

        for (limit, offset) in [(0, 0), (11, 0), (5, -1)] {
            let err = use_case(&repo)
                .execute(
                    &actor,
                    ListEntriesInput {
                        status: None,
                        limit: Some(limit),
                        offset: Some(offset),
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ReadingError::Validation { .. }));
        }
    }
}

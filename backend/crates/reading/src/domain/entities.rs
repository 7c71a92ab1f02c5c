//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{EntryId, UserId};

use super::value_objects::{Actor, Description, EntryKind, EntryStatus, Link, Title};
use crate::error::{ReadingError, ReadingResult};

/// Reading-list entry owned by a single user
#[derive(Debug, Clone)]
pub struct Entry {
    pub entry_id: EntryId,
    pub owner_id: UserId,
    pub title: Title,
    pub kind: EntryKind,
    pub link: Option<Link>,
    pub status: EntryStatus,
    pub description: Option<Description>,
    /// Path relative to the upload root, `<owner>/<file>`
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changes for a partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub title: Option<Title>,
    pub kind: Option<EntryKind>,
    pub link: Option<Link>,
    pub status: Option<EntryStatus>,
    pub description: Option<Description>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.kind.is_none()
            && self.link.is_none()
            && self.status.is_none()
            && self.description.is_none()
    }
}

impl Entry {
    pub fn new(
        owner_id: UserId,
        title: Title,
        kind: EntryKind,
        link: Option<Link>,
        status: Option<EntryStatus>,
        description: Option<Description>,
    ) -> Self {
        let now = Utc::now();
        Self {
            entry_id: EntryId::new(),
            owner_id,
            title,
            kind,
            link,
            status: status.unwrap_or_default(),
            description,
            cover_image: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fail with [`ReadingError::Forbidden`] unless `actor` may touch this entry
    pub fn ensure_accessible_by(&self, actor: &Actor) -> ReadingResult<()> {
        if actor.can_access(&self.owner_id) {
            Ok(())
        } else {
            Err(ReadingError::Forbidden)
        }
    }

    pub fn apply(&mut self, patch: EntryPatch) {
        if patch.is_empty() {
            return;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(link) = patch.link {
            self.link = Some(link);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        self.touch();
    }

    /// Swap the cover path, returning the previous one
    pub fn replace_cover(&mut self, cover: Option<String>) -> Option<String> {
        let previous = std::mem::replace(&mut self.cover_image, cover);
        self.touch();
        previous
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(owner: UserId) -> Entry {
        Entry::new(
            owner,
            Title::new("Dune").unwrap(),
            EntryKind::Book,
            None,
            None,
            None,
        )
    }

    #[test]
    fn test_new_defaults_to_read() {
        let entry = entry(UserId::new());
        assert_eq!(entry.status, EntryStatus::ToRead);
        assert!(entry.cover_image.is_none());
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn test_apply_only_touches_given_fields() {
        let mut entry = entry(UserId::new());
        entry.apply(EntryPatch {
            status: Some(EntryStatus::Completed),
            ..Default::default()
        });
        assert_eq!(entry.status, EntryStatus::Completed);
        assert_eq!(entry.title.as_str(), "Dune");
        assert_eq!(entry.kind, EntryKind::Book);
    }

    #[test]
    fn test_empty_patch_keeps_timestamp() {
        let mut entry = entry(UserId::new());
        let before = entry.updated_at;
        entry.apply(EntryPatch::default());
        assert_eq!(entry.updated_at, before);
    }

    #[test]
    fn test_access_rules() {
        let owner = UserId::new();
        let entry = entry(owner);
        assert!(entry.ensure_accessible_by(&Actor::new(owner, false)).is_ok());
        assert!(entry.ensure_accessible_by(&Actor::new(UserId::new(), true)).is_ok());
        assert!(matches!(
            entry.ensure_accessible_by(&Actor::new(UserId::new(), false)),
            Err(ReadingError::Forbidden)
        ));
    }

    #[test]
    fn test_replace_cover_returns_previous() {
        let mut entry = entry(UserId::new());
        assert_eq!(entry.replace_cover(Some("a/1.png".into())), None);
        assert_eq!(
            entry.replace_cover(Some("a/2.png".into())),
            Some("a/1.png".to_string())
        );
        assert_eq!(entry.cover_image.as_deref(), Some("a/2.png"));
    }
}

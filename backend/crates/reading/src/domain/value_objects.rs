//! Domain Value Objects
//!
//! Validated field types for reading-list entries.

use kernel::id::UserId;
use platform::url_guard::{SchemePolicy, classify};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ReadingError, ReadingResult};

pub const TITLE_MAX_CHARS: usize = 500;
pub const DESCRIPTION_MAX_CHARS: usize = 5000;

/// Kind of content an entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Book,
    Article,
    Video,
    Podcast,
    Other,
}

impl EntryKind {
    pub const ALL: [EntryKind; 5] = [
        EntryKind::Book,
        EntryKind::Article,
        EntryKind::Video,
        EntryKind::Podcast,
        EntryKind::Other,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Book => "book",
            EntryKind::Article => "article",
            EntryKind::Video => "video",
            EntryKind::Podcast => "podcast",
            EntryKind::Other => "other",
        }
    }
}

impl FromStr for EntryKind {
    type Err = ReadingError;

    fn from_str(s: &str) -> ReadingResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                ReadingError::validation(
                    "kind",
                    format!(
                        "Invalid kind. Must be one of: {}",
                        list(&Self::ALL.map(|k| k.as_str()))
                    ),
                )
            })
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reading progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    #[default]
    ToRead,
    InProgress,
    Completed,
    Archived,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 4] = [
        EntryStatus::ToRead,
        EntryStatus::InProgress,
        EntryStatus::Completed,
        EntryStatus::Archived,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::ToRead => "to_read",
            EntryStatus::InProgress => "in_progress",
            EntryStatus::Completed => "completed",
            EntryStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Comma separated list of accepted values, for error messages
    pub fn allowed() -> String {
        list(&Self::ALL.map(|s| s.as_str()))
    }
}

impl FromStr for EntryStatus {
    type Err = ReadingError;

    fn from_str(s: &str) -> ReadingResult<Self> {
        Self::parse(s).ok_or_else(|| {
            ReadingError::validation(
                "status",
                format!("Invalid status. Must be one of: {}", Self::allowed()),
            )
        })
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn list(values: &[&str]) -> String {
    values.join(", ")
}

/// Trimmed, non-empty title of at most [`TITLE_MAX_CHARS`] characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    pub fn new(raw: &str) -> ReadingResult<Self> {
        let title = raw.trim();
        if title.is_empty() {
            return Err(ReadingError::validation("title", "Title cannot be empty"));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(ReadingError::validation(
                "title",
                format!("Title must be at most {TITLE_MAX_CHARS} characters"),
            ));
        }
        Ok(Self(title.to_string()))
    }

    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(String);

impl Description {
    pub fn new(raw: String) -> ReadingResult<Self> {
        if raw.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(ReadingError::validation(
                "description",
                format!("Description must be at most {DESCRIPTION_MAX_CHARS} characters"),
            ));
        }
        Ok(Self(raw))
    }

    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// External link; https only and never pointing at private networks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link(String);

impl Link {
    pub fn new(raw: &str) -> ReadingResult<Self> {
        classify(raw, SchemePolicy::HttpsOnly)
            .map(|url| Self(url.to_string()))
            .map_err(|reason| {
                tracing::warn!(reason = reason.reason(), "Unsafe link rejected");
                ReadingError::UnsafeLink(reason)
            })
    }

    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Who is acting on entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(user_id: UserId, is_admin: bool) -> Self {
        Self { user_id, is_admin }
    }

    /// Owners see their own entries; admins see every entry
    pub fn can_access(&self, owner_id: &UserId) -> bool {
        self.is_admin || &self.user_id == owner_id
    }

    /// Owner filter applied to listings
    pub fn owner_scope(&self) -> Option<UserId> {
        (!self.is_admin).then_some(self.user_id)
    }
}

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u64,
}

impl Page {
    /// `limit` must lie in `1..=max_limit`, `offset` must not be negative
    pub fn new(limit: i64, offset: i64, max_limit: u32) -> ReadingResult<Self> {
        if limit < 1 || limit > i64::from(max_limit) {
            return Err(ReadingError::validation(
                "limit",
                format!("Limit must be between 1 and {max_limit}"),
            ));
        }
        if offset < 0 {
            return Err(ReadingError::validation(
                "offset",
                "Offset must be greater than or equal to 0",
            ));
        }
        Ok(Self {
            limit: limit as u32,
            offset: offset as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_status_codes() {
        assert_eq!("podcast".parse::<EntryKind>().unwrap(), EntryKind::Podcast);
        assert!("magazine".parse::<EntryKind>().is_err());
        assert_eq!(EntryStatus::parse("in_progress"), Some(EntryStatus::InProgress));
        assert_eq!(EntryStatus::parse("done"), None);
        assert_eq!(EntryStatus::default(), EntryStatus::ToRead);
        assert_eq!(
            serde_json::to_string(&EntryStatus::ToRead).unwrap(),
            "\"to_read\""
        );
    }

    #[test]
    fn test_title_rules() {
        assert_eq!(Title::new("  Dune  ").unwrap().as_str(), "Dune");
        assert!(Title::new("   ").is_err());
        assert!(Title::new(&"t".repeat(TITLE_MAX_CHARS)).is_ok());
        assert!(Title::new(&"t".repeat(TITLE_MAX_CHARS + 1)).is_err());
    }

    #[test]
    fn test_description_limit() {
        assert!(Description::new("d".repeat(DESCRIPTION_MAX_CHARS)).is_ok());
        assert!(Description::new("d".repeat(DESCRIPTION_MAX_CHARS + 1)).is_err());
    }

    #[test]
    fn test_link_requires_safe_https() {
        assert!(Link::new("https://example.com/article").is_ok());
        for raw in [
            "http://example.com/article",
            "https://localhost/x",
            "https://10.0.0.5/x",
            "https://printer.local/x",
            "javascript:alert(1)",
        ] {
            assert!(
                matches!(Link::new(raw), Err(ReadingError::UnsafeLink(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_actor_scope() {
        let owner = UserId::new();
        let user = Actor::new(owner, false);
        let admin = Actor::new(UserId::new(), true);

        assert!(user.can_access(&owner));
        assert!(!user.can_access(&UserId::new()));
        assert!(admin.can_access(&owner));
        assert_eq!(user.owner_scope(), Some(owner));
        assert_eq!(admin.owner_scope(), None);
    }

    #[test]
    fn test_page_bounds() {
        assert!(Page::new(1, 0, 100).is_ok());
        assert!(Page::new(100, 5, 100).is_ok());
        assert!(Page::new(0, 0, 100).is_err());
        assert!(Page::new(101, 0, 100).is_err());
        assert!(Page::new(10, -1, 100).is_err());
    }
}

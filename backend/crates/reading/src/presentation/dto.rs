//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{CreateEntryInput, EntryPage, ListEntriesInput, UpdateEntryInput};
use crate::domain::entities::Entry;
use crate::domain::value_objects::{Description, EntryKind, EntryStatus, Link};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntryRequest {
    pub title: String,
    pub kind: EntryKind,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub status: Option<EntryStatus>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<CreateEntryRequest> for CreateEntryInput {
    fn from(req: CreateEntryRequest) -> Self {
        Self {
            title: req.title,
            kind: req.kind,
            link: req.link,
            status: req.status,
            description: req.description,
        }
    }
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEntryRequest {
    pub title: Option<String>,
    pub kind: Option<EntryKind>,
    pub link: Option<String>,
    pub status: Option<EntryStatus>,
    pub description: Option<String>,
}

impl From<UpdateEntryRequest> for UpdateEntryInput {
    fn from(req: UpdateEntryRequest) -> Self {
        Self {
            title: req.title,
            kind: req.kind,
            link: req.link,
            status: req.status,
            description: req.description,
        }
    }
}

/// `GET /entries` query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEntriesQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListEntriesQuery> for ListEntriesInput {
    fn from(query: ListEntriesQuery) -> Self {
        Self {
            status: query.status,
            limit: query.limit,
            offset: query.offset,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub kind: EntryKind,
    pub link: Option<String>,
    pub status: EntryStatus,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Entry> for EntryResponse {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.entry_id.into_uuid(),
            owner_id: entry.owner_id.into_uuid(),
            title: entry.title.as_str().to_string(),
            kind: entry.kind,
            link: entry.link.as_ref().map(Link::as_str).map(str::to_string),
            status: entry.status,
            description: entry
                .description
                .as_ref()
                .map(Description::as_str)
                .map(str::to_string),
            cover_image: entry.cover_image.clone(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryListResponse {
    pub items: Vec<EntryResponse>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

impl From<EntryPage> for EntryListResponse {
    fn from(page: EntryPage) -> Self {
        Self {
            items: page.items.iter().map(EntryResponse::from).collect(),
            total: page.total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

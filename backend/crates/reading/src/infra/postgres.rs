//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use kernel::id::{EntryId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::Entry;
use crate::domain::repository::{EntryFilter, EntryRepository};
use crate::domain::value_objects::{Description, EntryKind, EntryStatus, Link, Page, Title};
use crate::error::{ReadingError, ReadingResult};

const ENTRY_COLUMNS: &str = "id, owner_id, title, kind, link, status, description, \
                             cover_image, created_at, updated_at";

/// PostgreSQL-backed entry repository
#[derive(Clone)]
pub struct PgEntryRepository {
    pool: PgPool,
}

impl PgEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl EntryRepository for PgEntryRepository {
    async fn create(&self, entry: &Entry) -> ReadingResult<()> {
        sqlx::query(
            r#"
            INSERT INTO entries (
                id,
                owner_id,
                title,
                kind,
                link,
                status,
                description,
                cover_image,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.entry_id.as_uuid())
        .bind(entry.owner_id.as_uuid())
        .bind(entry.title.as_str())
        .bind(entry.kind.as_str())
        .bind(entry.link.as_ref().map(Link::as_str))
        .bind(entry.status.as_str())
        .bind(entry.description.as_ref().map(Description::as_str))
        .bind(entry.cover_image.as_deref())
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, entry_id: &EntryId) -> ReadingResult<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE id = $1"
        ))
        .bind(entry_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn list(&self, filter: EntryFilter, page: Page) -> ReadingResult<(Vec<Entry>, u64)> {
        let owner = filter.owner.map(UserId::into_uuid);
        let status = filter.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM entries
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(owner)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM entries
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(owner)
        .bind(status)
        .bind(i64::from(page.limit))
        .bind(i64::try_from(page.offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(EntryRow::into_entry)
            .collect::<ReadingResult<Vec<_>>>()?;

        Ok((items, total.max(0) as u64))
    }

    async fn update(&self, entry: &Entry) -> ReadingResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE entries SET
                title = $2,
                kind = $3,
                link = $4,
                status = $5,
                description = $6,
                cover_image = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(entry.entry_id.as_uuid())
        .bind(entry.title.as_str())
        .bind(entry.kind.as_str())
        .bind(entry.link.as_ref().map(Link::as_str))
        .bind(entry.status.as_str())
        .bind(entry.description.as_ref().map(Description::as_str))
        .bind(entry.cover_image.as_deref())
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ReadingError::EntryNotFound);
        }
        Ok(())
    }

    async fn delete(&self, entry_id: &EntryId) -> ReadingResult<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(entry_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    kind: String,
    link: Option<String>,
    status: String,
    description: Option<String>,
    cover_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EntryRow {
    fn into_entry(self) -> ReadingResult<Entry> {
        let kind: EntryKind = self
            .kind
            .parse()
            .map_err(|_| ReadingError::Internal(format!("Invalid kind: {}", self.kind)))?;
        let status = EntryStatus::parse(&self.status)
            .ok_or_else(|| ReadingError::Internal(format!("Invalid status: {}", self.status)))?;

        Ok(Entry {
            entry_id: EntryId::from_uuid(self.id),
            owner_id: UserId::from_uuid(self.owner_id),
            title: Title::from_db(self.title),
            kind,
            link: self.link.map(Link::from_db),
            status,
            description: self.description.map(Description::from_db),
            cover_image: self.cover_image,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

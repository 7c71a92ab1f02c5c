//! HTTP Handlers

use auth::CurrentUser;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::id::EntryId;
use platform::upload::UploadStore;
use std::sync::Arc;

use crate::application::{
    CreateEntryUseCase, DeleteEntryUseCase, GetEntryUseCase, ListEntriesUseCase, ReadingConfig,
    RemoveCoverUseCase, SetCoverUseCase, UpdateEntryUseCase,
};
use crate::domain::repository::EntryRepository;
use crate::domain::value_objects::Actor;
use crate::error::{ReadingError, ReadingResult};
use crate::presentation::dto::{
    CreateEntryRequest, EntryListResponse, EntryResponse, ListEntriesQuery, UpdateEntryRequest,
};

/// Shared state for entry handlers
#[derive(Clone)]
pub struct ReadingAppState<R>
where
    R: EntryRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub uploads: Arc<UploadStore>,
    pub config: ReadingConfig,
}

impl<R> ReadingAppState<R>
where
    R: EntryRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, uploads: Arc<UploadStore>, config: ReadingConfig) -> Self {
        Self {
            repo,
            uploads,
            config,
        }
    }
}

fn actor(current: &CurrentUser) -> Actor {
    Actor::new(current.user_id, current.is_admin())
}

/// Unparsable ids cannot name an existing entry
fn entry_id(raw: &str) -> ReadingResult<EntryId> {
    raw.parse().map_err(|_| ReadingError::EntryNotFound)
}

// ============================================================================
// Entries
// ============================================================================

/// POST /entries
pub async fn create_entry<R>(
    State(state): State<ReadingAppState<R>>,
    current: CurrentUser,
    req: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> ReadingResult<(StatusCode, Json<EntryResponse>)>
where
    R: EntryRepository + Clone + Send + Sync + 'static,
{
    let Json(req) = req?;
    let entry = CreateEntryUseCase::new(state.repo.clone())
        .execute(&actor(&current), req.into())
        .await?;

    Ok((StatusCode::CREATED, Json(EntryResponse::from(&entry))))
}

/// GET /entries
pub async fn list_entries<R>(
    State(state): State<ReadingAppState<R>>,
    current: CurrentUser,
    query: Result<Query<ListEntriesQuery>, QueryRejection>,
) -> ReadingResult<Json<EntryListResponse>>
where
    R: EntryRepository + Clone + Send + Sync + 'static,
{
    let Query(query) = query?;
    let page = ListEntriesUseCase::new(state.repo.clone(), state.config)
        .execute(&actor(&current), query.into())
        .await?;

    Ok(Json(page.into()))
}

/// GET /entries/{id}
pub async fn get_entry<R>(
    State(state): State<ReadingAppState<R>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ReadingResult<Json<EntryResponse>>
where
    R: EntryRepository + Clone + Send + Sync + 'static,
{
    let entry = GetEntryUseCase::new(state.repo.clone())
        .execute(&actor(&current), &entry_id(&id)?)
        .await?;

    Ok(Json(EntryResponse::from(&entry)))
}

/// PATCH /entries/{id}
pub async fn update_entry<R>(
    State(state): State<ReadingAppState<R>>,
    current: CurrentUser,
    Path(id): Path<String>,
    req: Result<Json<UpdateEntryRequest>, JsonRejection>,
) -> ReadingResult<Json<EntryResponse>>
where
    R: EntryRepository + Clone + Send + Sync + 'static,
{
    let Json(req) = req?;
    let entry = UpdateEntryUseCase::new(state.repo.clone())
        .execute(&actor(&current), &entry_id(&id)?, req.into())
        .await?;

    Ok(Json(EntryResponse::from(&entry)))
}

/// DELETE /entries/{id}
pub async fn delete_entry<R>(
    State(state): State<ReadingAppState<R>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ReadingResult<StatusCode>
where
    R: EntryRepository + Clone + Send + Sync + 'static,
{
    DeleteEntryUseCase::new(state.repo.clone(), state.uploads.clone())
        .execute(&actor(&current), &entry_id(&id)?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Cover image
// ============================================================================

/// PUT /entries/{id}/cover
///
/// The body is the raw image. Its size is capped by the route's body limit
/// before the upload pipeline checks it again.
pub async fn put_cover<R>(
    State(state): State<ReadingAppState<R>>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> ReadingResult<Json<EntryResponse>>
where
    R: EntryRepository + Clone + Send + Sync + 'static,
{
    let entry_id = entry_id(&id)?;
    let data = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ReadingError::BodyTooLarge {
                max: state.uploads.max_bytes(),
            }
        } else {
            ReadingError::Internal(format!("Failed to read upload body: {rejection}"))
        }
    })?;

    let entry = SetCoverUseCase::new(state.repo.clone(), state.uploads.clone())
        .execute(&actor(&current), &entry_id, data)
        .await?;

    Ok(Json(EntryResponse::from(&entry)))
}

/// DELETE /entries/{id}/cover
pub async fn delete_cover<R>(
    State(state): State<ReadingAppState<R>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ReadingResult<Json<EntryResponse>>
where
    R: EntryRepository + Clone + Send + Sync + 'static,
{
    let entry = RemoveCoverUseCase::new(state.repo.clone(), state.uploads.clone())
        .execute(&actor(&current), &entry_id(&id)?)
        .await?;

    Ok(Json(EntryResponse::from(&entry)))
}

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::error::ApiError;
use super::extract::Owner;
use super::state::AppState;
use crate::models::{CreateNoteRequest, DeleteConfirmation, Note, UpdateNoteRequest};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

/// `GET /notes?search=`
pub async fn list_notes(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Note>>, ApiError> {
    info!(owner = %owner, search = ?params.search, "fetching notes");

    let search = params.search.filter(|s| !s.is_empty());
    let notes = state
        .with_db(move |db| db.list_notes(&owner, search.as_deref()))
        .await?;

    info!(count = notes.len(), "notes found");
    Ok(Json(notes))
}

/// `POST /notes`
pub async fn create_note(
    State(state): State<AppState>,
    Owner(owner): Owner,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::MalformedPayload)?;
    let draft = request.validate()?;

    let note = Note::new(owner, draft);
    info!(owner = %note.owner_id, note = %note.id, "creating note");

    let note = state
        .with_db(move |db| {
            db.insert_note(&note)?;
            Ok(note)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// `PUT /notes/{id}`
pub async fn update_note(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    payload: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> Result<Json<Note>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::MalformedPayload)?;
    let update = request.validate()?;
    let id = parse_note_id(&id)?;

    info!(owner = %owner, note = %id, archived = update.archived, "updating note");

    let note = state
        .with_db(move |db| db.update_note(&owner, id, &update))
        .await?
        .ok_or_else(|| {
            info!(note = %id, "note not found");
            ApiError::NotFound
        })?;

    Ok(Json(note))
}

/// `DELETE /notes/{id}`
pub async fn delete_note(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<DeleteConfirmation>, ApiError> {
    let id = parse_note_id(&id)?;
    info!(owner = %owner, note = %id, "deleting note");

    let deleted = state.with_db(move |db| db.delete_note(&owner, id)).await?;
    if !deleted {
        info!(note = %id, "note not found");
        return Err(ApiError::NotFound);
    }

    Ok(Json(DeleteConfirmation {
        message: "Note deleted".to_string(),
    }))
}

/// A malformed id cannot name an existing note, so it reads as not found.
fn parse_note_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

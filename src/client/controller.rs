//! In-memory note state for the signed-in user.
//!
//! The controller keeps one list of notes and splits it into active and
//! archived views by flag. Every server call goes through [`ApiGateway`] with
//! the explicit [`Session`]. Failures land in [`NoteController::error`] and
//! are also returned to the caller.
//!
//! Two operations are split into request/apply halves so that responses can
//! be reconciled against newer state:
//!
//! * searches carry a sequence number, and only the latest one is applied;
//! * archive toggles apply immediately and are reverted if the server call
//!   fails.

use reqwest::Method;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::gateway::{ApiGateway, ClientError};
use super::session::Session;
use crate::models::{
    CreateNoteRequest, DeleteConfirmation, Note, NoteDraft, NoteStats, UpdateNoteRequest,
};

const FETCH_FAILED: &str = "Failed to fetch notes";
const ADD_FAILED: &str = "Failed to add note";
const UPDATE_FAILED: &str = "Failed to update note";
const DELETE_FAILED: &str = "Failed to delete note";
const ARCHIVE_FAILED: &str = "Failed to archive note";

/// `/notes?search=<term>`, with the term form-encoded.
pub fn notes_endpoint(search: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(search.as_bytes()).collect();
    format!("/notes?search={}", encoded)
}

pub fn note_endpoint(id: Uuid) -> String {
    format!("/notes/{}", id)
}

pub struct NoteController {
    gateway: ApiGateway,
    session: Session,
    notes: Vec<Note>,
    search: String,
    error: Option<String>,
    latest_search: u64,
}

/// A List call tagged with the sequence number it was issued under.
pub struct SearchRequest {
    gateway: ApiGateway,
    session: Session,
    seq: u64,
    term: String,
}

pub struct SearchResponse {
    seq: u64,
    result: Result<Vec<Note>, ClientError>,
}

impl SearchRequest {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub async fn send(self) -> SearchResponse {
        let result = self
            .gateway
            .get(&notes_endpoint(&self.term), Some(&self.session))
            .await;
        SearchResponse {
            seq: self.seq,
            result,
        }
    }
}

/// The background Update behind an optimistic archive toggle.
pub struct ArchiveRequest {
    gateway: ApiGateway,
    session: Session,
    id: Uuid,
    previous: bool,
    body: UpdateNoteRequest,
}

pub struct ArchiveResponse {
    id: Uuid,
    previous: bool,
    result: Result<Note, ClientError>,
}

impl ArchiveRequest {
    pub async fn send(self) -> ArchiveResponse {
        let result = self
            .gateway
            .request(
                &note_endpoint(self.id),
                Method::PUT,
                Some(&self.body),
                Some(&self.session),
            )
            .await;
        ArchiveResponse {
            id: self.id,
            previous: self.previous,
            result,
        }
    }
}

impl NoteController {
    pub fn new(gateway: ApiGateway, session: Session) -> Self {
        Self {
            gateway,
            session,
            notes: Vec::new(),
            search: String::new(),
            error: None,
            latest_search: 0,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn active(&self) -> Vec<&Note> {
        self.notes.iter().filter(|n| !n.archived).collect()
    }

    pub fn archived(&self) -> Vec<&Note> {
        self.notes.iter().filter(|n| n.archived).collect()
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    /// The error banner, if the last failing operation left one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn stats(&self) -> NoteStats {
        NoteStats::from_notes(&self.notes)
    }

    // ==================== LOAD / SEARCH ====================

    /// Start a List for `term`. Any response from an earlier search that
    /// arrives afterwards is discarded by [`Self::apply_search`].
    pub fn begin_search(&mut self, term: &str) -> SearchRequest {
        self.latest_search += 1;
        self.search = term.to_string();
        SearchRequest {
            gateway: self.gateway.clone(),
            session: self.session.clone(),
            seq: self.latest_search,
            term: self.search.clone(),
        }
    }

    /// Apply a search response. Returns `None` if it was stale and ignored,
    /// otherwise the outcome of the List call.
    pub fn apply_search(&mut self, response: SearchResponse) -> Option<Result<(), ClientError>> {
        if response.seq != self.latest_search {
            debug!(
                seq = response.seq,
                latest = self.latest_search,
                "discarding stale search response"
            );
            return None;
        }

        Some(match response.result {
            Ok(notes) => {
                self.notes = notes;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                error!("Fetch notes error: {e}");
                self.notes.clear();
                self.error = Some(FETCH_FAILED.to_string());
                Err(e)
            }
        })
    }

    /// Replace the list with the server's notes for `term`.
    pub async fn load(&mut self, term: &str) -> Result<(), ClientError> {
        let response = self.begin_search(term).send().await;
        self.apply_search(response).unwrap_or(Ok(()))
    }

    // ==================== CREATE ====================

    /// Create on the server, then append the returned note.
    pub async fn create(&mut self, title: &str, content: &str) -> Result<&Note, ClientError> {
        let draft = self.validate(title, content)?;
        let body = CreateNoteRequest {
            title: draft.title,
            content: draft.content,
        };

        let result: Result<Note, _> = self
            .gateway
            .request("/notes", Method::POST, Some(&body), Some(&self.session))
            .await;

        let note = self.settle(result, ADD_FAILED)?;
        self.notes.push(note);
        Ok(&self.notes[self.notes.len() - 1])
    }

    // ==================== EDIT ====================

    /// Update title and content, keeping the note's current archive flag.
    pub async fn edit(
        &mut self,
        id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<&Note, ClientError> {
        let draft = self.validate(title, content)?;
        let archived = self.note(id).ok_or(ClientError::UnknownNote(id))?.archived;
        let body = UpdateNoteRequest {
            title: draft.title,
            content: draft.content,
            archived: Some(archived),
        };

        let result: Result<Note, _> = self
            .gateway
            .request(&note_endpoint(id), Method::PUT, Some(&body), Some(&self.session))
            .await;

        let note = self.settle(result, UPDATE_FAILED)?;
        Ok(self.replace(note))
    }

    // ==================== DELETE ====================

    pub async fn delete(&mut self, id: Uuid) -> Result<(), ClientError> {
        let result: Result<DeleteConfirmation, _> =
            self.gateway.delete(&note_endpoint(id), Some(&self.session)).await;

        self.settle(result, DELETE_FAILED)?;
        self.notes.retain(|n| n.id != id);
        Ok(())
    }

    // ==================== ARCHIVE ====================

    /// Flip the archive flag locally right away and return the Update that
    /// confirms it. Pass its response to [`Self::reconcile_archive`].
    pub fn toggle_archive(&mut self, id: Uuid) -> Result<ArchiveRequest, ClientError> {
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(ClientError::UnknownNote(id))?;

        let previous = note.archived;
        note.archived = !previous;
        let body = UpdateNoteRequest::from_note(note);

        Ok(ArchiveRequest {
            gateway: self.gateway.clone(),
            session: self.session.clone(),
            id,
            previous,
            body,
        })
    }

    /// Adopt the server's note on success; revert the flag on failure.
    pub fn reconcile_archive(&mut self, response: ArchiveResponse) -> Result<(), ClientError> {
        match response.result {
            Ok(note) => {
                self.replace(note);
                Ok(())
            }
            Err(e) => {
                warn!(note = %response.id, "Archive toggle error: {e}");
                if let Some(note) = self.notes.iter_mut().find(|n| n.id == response.id) {
                    note.archived = response.previous;
                }
                self.error = Some(ARCHIVE_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Set the archive flag, waiting for the server to confirm.
    pub async fn set_archived(&mut self, id: Uuid, archived: bool) -> Result<(), ClientError> {
        let current = self.note(id).ok_or(ClientError::UnknownNote(id))?.archived;
        if current == archived {
            return Ok(());
        }
        let response = self.toggle_archive(id)?.send().await;
        self.reconcile_archive(response)
    }

    // ==================== HELPERS ====================

    fn validate(&mut self, title: &str, content: &str) -> Result<NoteDraft, ClientError> {
        NoteDraft::new(title, content).map_err(|e| {
            self.error = Some(e.to_string());
            ClientError::from(e)
        })
    }

    /// Record the outcome of a server call in the error banner.
    fn settle<T>(
        &mut self,
        result: Result<T, ClientError>,
        failure: &str,
    ) -> Result<T, ClientError> {
        match result {
            Ok(value) => {
                self.error = None;
                Ok(value)
            }
            Err(e) => {
                error!("{failure}: {e}");
                self.error = Some(failure.to_string());
                Err(e)
            }
        }
    }

    /// Swap in the server's copy of a note, appending it if it is not loaded.
    fn replace(&mut self, note: Note) -> &Note {
        match self.notes.iter().position(|n| n.id == note.id) {
            Some(idx) => {
                self.notes[idx] = note;
                &self.notes[idx]
            }
            None => {
                self.notes.push(note);
                &self.notes[self.notes.len() - 1]
            }
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::OwnerId;

/// A persisted note. Field names on the wire follow the document shape
/// `{ _id, userId, title, content, createdAt, updatedAt, isArchived }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub owner_id: OwnerId,
    pub title: String,
    pub content: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "isArchived", default)]
    pub archived: bool,
}

impl Note {
    /// Build a fresh, unarchived note for `owner` from a validated draft.
    pub fn new(owner_id: OwnerId, draft: NoteDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: draft.title,
            content: draft.content,
            created_at: now,
            updated_at: now,
            archived: false,
        }
    }

    /// Content length in characters, used for profile statistics.
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title and content are required")]
    MissingFields,
}

/// Title and content that passed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let content = content.into();
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Ok(Self { title, content })
    }
}

/// Body of `POST /notes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl CreateNoteRequest {
    pub fn validate(self) -> Result<NoteDraft, ValidationError> {
        NoteDraft::new(self.title, self.content)
    }
}

/// Body of `PUT /notes/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "isArchived", alias = "archived", skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl UpdateNoteRequest {
    /// Full replacement built from an existing note, carrying its current flag.
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            archived: Some(note.archived),
        }
    }

    pub fn validate(self) -> Result<NoteUpdate, ValidationError> {
        let draft = NoteDraft::new(self.title, self.content)?;
        Ok(NoteUpdate {
            draft,
            archived: self.archived.unwrap_or(false),
        })
    }
}

/// A validated update. An omitted archive flag resolves to `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteUpdate {
    pub draft: NoteDraft,
    pub archived: bool,
}

/// Body of a successful `DELETE /notes/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Aggregate figures shown on the profile view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NoteStats {
    pub total: usize,
    pub archived: usize,
    pub average_length: usize,
}

impl NoteStats {
    pub fn from_notes<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Self {
        let mut stats = Self::default();
        let mut chars = 0usize;
        for note in notes {
            stats.total += 1;
            if note.archived {
                stats.archived += 1;
            }
            chars += note.content_len();
        }
        if stats.total > 0 {
            stats.average_length = chars / stats.total;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> OwnerId {
        OwnerId::parse("alice").unwrap()
    }

    #[test]
    fn test_new_note_defaults() {
        let note = Note::new(owner(), NoteDraft::new("Shopping", "milk, eggs").unwrap());
        assert!(!note.archived);
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(note.owner_id, owner());
    }

    #[test]
    fn test_draft_rejects_blank_fields() {
        assert_eq!(NoteDraft::new("", "body"), Err(ValidationError::MissingFields));
        assert_eq!(NoteDraft::new("title", ""), Err(ValidationError::MissingFields));
        assert_eq!(NoteDraft::new("   ", "body"), Err(ValidationError::MissingFields));
        assert!(NoteDraft::new("title", "body").is_ok());
    }

    #[test]
    fn test_note_json_shape() {
        let note = Note::new(owner(), NoteDraft::new("a", "b").unwrap());
        let value = serde_json::to_value(&note).unwrap();
        for key in ["_id", "userId", "title", "content", "createdAt", "updatedAt", "isArchived"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["userId"], "alice");
        assert_eq!(value["isArchived"], false);
    }

    #[test]
    fn test_create_request_missing_field_fails_validation() {
        let req: CreateNoteRequest = serde_json::from_str(r#"{"title":"only"}"#).unwrap();
        assert_eq!(req.validate(), Err(ValidationError::MissingFields));
    }

    #[test]
    fn test_update_request_archived_defaults_to_false() {
        let req: UpdateNoteRequest =
            serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert!(!req.validate().unwrap().archived);

        let req: UpdateNoteRequest =
            serde_json::from_str(r#"{"title":"t","content":"c","archived":true}"#).unwrap();
        assert!(req.validate().unwrap().archived);

        let req: UpdateNoteRequest =
            serde_json::from_str(r#"{"title":"t","content":"c","isArchived":true}"#).unwrap();
        assert!(req.validate().unwrap().archived);
    }

    #[test]
    fn test_update_request_from_note_keeps_flag() {
        let mut note = Note::new(owner(), NoteDraft::new("a", "b").unwrap());
        note.archived = true;
        let req = UpdateNoteRequest::from_note(&note);
        assert_eq!(req.archived, Some(true));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["isArchived"], true);
    }

    #[test]
    fn test_stats() {
        let mut a = Note::new(owner(), NoteDraft::new("a", "1234").unwrap());
        let b = Note::new(owner(), NoteDraft::new("b", "12").unwrap());
        a.archived = true;
        let stats = NoteStats::from_notes([&a, &b]);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.archived, 1);
        assert_eq!(stats.average_length, 3);

        assert_eq!(NoteStats::from_notes(std::iter::empty()), NoteStats::default());
    }
}

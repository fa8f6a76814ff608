use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{Database, FOLD_CASE_FN};
use crate::models::{Note, NoteUpdate, OwnerId};

const NOTE_COLUMNS: &str = "id, user_id, title, content, created_at, updated_at, is_archived";

/// Helper to convert UUID parse errors to rusqlite errors
fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Fixed-width UTC form, so text order in SQLite equals time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

impl Database {
    // ==================== NOTE CREATE ====================

    pub fn insert_note(&self, note: &Note) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO notes (id, user_id, title, content, created_at, updated_at, is_archived)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                note.id.to_string(),
                note.owner_id.as_str(),
                note.title,
                note.content,
                format_timestamp(&note.created_at),
                format_timestamp(&note.updated_at),
                note.archived as i32,
            ],
        )?;
        Ok(())
    }

    // ==================== NOTE READ ====================

    /// All of `owner`'s notes, newest first. A non-empty `search` keeps notes
    /// whose title or content contains it, ignoring case (Unicode lowercase).
    pub fn list_notes(&self, owner: &OwnerId, search: Option<&str>) -> Result<Vec<Note>> {
        let term = search.filter(|s| !s.is_empty());

        let notes = match term {
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM notes WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
                    NOTE_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([owner.as_str()], Self::row_to_note)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            Some(term) => {
                let pattern = format!("%{}%", Self::escape_like(&term.to_lowercase()));
                // ESCAPE '\' enables backslash escaping for % and _ literals
                let mut stmt = self.conn.prepare(&format!(
                    r#"SELECT {cols} FROM notes
                       WHERE user_id = ?1
                         AND ({fold}(title) LIKE ?2 ESCAPE '\'
                              OR {fold}(content) LIKE ?2 ESCAPE '\')
                       ORDER BY created_at DESC, rowid DESC"#,
                    cols = NOTE_COLUMNS,
                    fold = FOLD_CASE_FN,
                ))?;
                let rows = stmt
                    .query_map(params![owner.as_str(), pattern], Self::row_to_note)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };

        Ok(notes)
    }

    #[cfg(test)]
    pub fn get_note(&self, owner: &OwnerId, id: Uuid) -> Result<Option<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM notes WHERE id = ? AND user_id = ?",
            NOTE_COLUMNS
        ))?;

        let result = stmt.query_row(params![id.to_string(), owner.as_str()], Self::row_to_note);

        match result {
            Ok(note) => Ok(Some(note)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(test)]
    pub fn count_notes(&self, owner: &OwnerId) -> Result<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE user_id = ?",
            [owner.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Escape LIKE metacharacters (% _ \)
    fn escape_like(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '%' | '_' | '\\' => {
                    result.push('\\');
                    result.push(c);
                }
                _ => result.push(c),
            }
        }
        result
    }

    // ==================== NOTE UPDATE ====================

    /// Replace title, content and archive flag of the note matching
    /// `(id, owner)` and refresh `updated_at`. Returns `None` when no note
    /// matches, which covers notes owned by someone else.
    pub fn update_note(
        &self,
        owner: &OwnerId,
        id: Uuid,
        update: &NoteUpdate,
    ) -> Result<Option<Note>> {
        let now = Utc::now();
        let sql = format!(
            r#"UPDATE notes SET title = ?1, content = ?2, is_archived = ?3, updated_at = ?4
               WHERE id = ?5 AND user_id = ?6
               RETURNING {}"#,
            NOTE_COLUMNS
        );

        let result = self.conn.query_row(
            &sql,
            params![
                update.draft.title,
                update.draft.content,
                update.archived as i32,
                format_timestamp(&now),
                id.to_string(),
                owner.as_str(),
            ],
            Self::row_to_note,
        );

        match result {
            Ok(note) => Ok(Some(note)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ==================== NOTE DELETE ====================

    /// Hard delete. Returns false when no note matches `(id, owner)`.
    pub fn delete_note(&self, owner: &OwnerId, id: Uuid) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM notes WHERE id = ? AND user_id = ?",
            params![id.to_string(), owner.as_str()],
        )?;
        Ok(rows > 0)
    }

    fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
        let id: String = row.get(0)?;
        let user_id: String = row.get(1)?;
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;

        let owner_id = OwnerId::parse(&user_id).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                "empty owner id".into(),
            )
        })?;

        Ok(Note {
            id: parse_uuid(&id)?,
            owner_id,
            title: row.get(2)?,
            content: row.get(3)?,
            created_at: parse_timestamp(4, &created_at)?,
            updated_at: parse_timestamp(5, &updated_at)?,
            archived: row.get::<_, i32>(6)? == 1,
        })
    }
}

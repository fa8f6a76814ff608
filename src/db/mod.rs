use anyhow::Result;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::path::PathBuf;

mod notes;
mod schema;

pub use schema::SCHEMA_VERSION;

/// SQL function folding text to lowercase with full Unicode rules.
/// SQLite's own `LOWER()` only folds ASCII.
pub const FOLD_CASE_FN: &str = "fold_case";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the notes file at `path`, creating it and its directory if needed
    pub fn open_at(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(&path)?)
    }

    /// Open an in-memory store, used by tests
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.create_scalar_function(
            FOLD_CASE_FN,
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: String = ctx.get(0)?;
                Ok(text.to_lowercase())
            },
        )?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        if self.get_schema_version()? < SCHEMA_VERSION {
            let tx = self.conn.unchecked_transaction()?;
            tx.execute_batch(schema::SCHEMA_V1)?;
            tx.execute(
                "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?1)",
                [SCHEMA_VERSION],
            )?;
            tx.commit()?;
        }
        Ok(())
    }

    /// Version recorded in `schema_version`, or 0 for a fresh file.
    fn get_schema_version(&self) -> Result<i32> {
        let version = self
            .conn
            .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional();

        match version {
            Ok(v) => Ok(v.unwrap_or(0)),
            // A fresh file has no schema_version table yet
            Err(rusqlite::Error::SqliteFailure(err, Some(msg)))
                if err.code == ErrorCode::Unknown && msg.contains("no such table") =>
            {
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.get_schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_exist() {
        let db = Database::open_memory().unwrap();

        let tables: Vec<String> = db
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"notes".to_string()));
        assert!(tables.contains(&"schema_version".to_string()));
    }

    #[test]
    fn test_fold_case_handles_unicode() {
        let db = Database::open_memory().unwrap();
        let folded: String = db
            .conn
            .query_row(&format!("SELECT {}('CAFÉ Ünïcode')", FOLD_CASE_FN), [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(folded, "café ünïcode");
    }

    #[test]
    fn test_reopen_keeps_data_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.db");

        {
            let db = Database::open_at(path.clone()).unwrap();
            let owner = crate::models::OwnerId::parse("alice").unwrap();
            let draft = crate::models::NoteDraft::new("kept", "across reopen").unwrap();
            db.insert_note(&crate::models::Note::new(owner, draft)).unwrap();
        }

        let db = Database::open_at(path).unwrap();
        assert_eq!(db.get_schema_version().unwrap(), SCHEMA_VERSION);
        let owner = crate::models::OwnerId::parse("alice").unwrap();
        assert_eq!(db.list_notes(&owner, None).unwrap().len(), 1);
    }
}

//! Explicit session context.
//!
//! A [`Session`] is created on login, handed to every gateway call, and
//! destroyed on logout or when the server rejects its token.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::write_private;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub api_url: String,
}

impl Session {
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: api_url.into(),
        }
    }
}

/// File-backed persistence for a single session.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;
        let session = serde_json::from_str(&raw).context("Session file is corrupt; run logout")?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_private(&self.path, &serde_json::to_string_pretty(session)?)
    }

    /// Remove the stored session. Returns false if there was none.
    pub fn destroy(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("notecmd").join("session.json"));

        assert!(store.load().unwrap().is_none());
        assert!(store.path().ends_with("notecmd/session.json"));

        let session = Session::new("tok", "http://localhost:5000/api");
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        assert!(store.destroy().unwrap());
        assert!(!store.destroy().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_session_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(SessionStore::new(path).load().is_err());
    }
}

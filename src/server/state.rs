use anyhow::anyhow;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::error::ApiError;
use crate::auth::Authenticator;
use crate::db::Database;

/// Shared by every request: the store connection and the authenticator.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
    authenticator: Arc<dyn Authenticator>,
    started: Instant,
}

impl AppState {
    pub fn new(db: Database, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            authenticator,
            started: Instant::now(),
        }
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Run a store operation on the blocking pool.
    pub async fn with_db<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| anyhow!("database lock poisoned"))?;
            op(&guard)
        })
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .map_err(ApiError::Internal)
    }
}

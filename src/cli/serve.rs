use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::auth::SignedTokenAuthenticator;
use crate::config::ServerConfig;
use crate::db::Database;
use crate::server::{self, AppState};

/// Execute the serve command. Flags override the loaded configuration.
pub async fn run_serve(
    mut config: ServerConfig,
    port: Option<u16>,
    db_path: Option<PathBuf>,
) -> Result<()> {
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(path) = db_path {
        config.db_path = path;
    }

    info!("Opening database at {}", config.db_path.display());
    let db = Database::open_at(config.db_path.clone())?;
    let authenticator = SignedTokenAuthenticator::new(config.secret, config.token_ttl);
    let state = AppState::new(db, Arc::new(authenticator));

    server::run(config.port, state).await
}

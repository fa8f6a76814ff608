//! Runtime configuration.
//!
//! Every setting comes from an environment variable with a default. Command
//! line flags override what is loaded here.

use anyhow::{anyhow, Context, Result};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::auth::generate_secret;

const APP_DIR: &str = "notecmd";

pub const ENV_PORT: &str = "NOTECMD_PORT";
pub const ENV_DB: &str = "NOTECMD_DB";
pub const ENV_SECRET: &str = "NOTECMD_SECRET";
pub const ENV_TOKEN_TTL_DAYS: &str = "NOTECMD_TOKEN_TTL_DAYS";
pub const ENV_API_URL: &str = "NOTECMD_API_URL";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TOKEN_TTL_DAYS: u64 = 30;
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// `<config_dir>/notecmd`, home of the database, secret and session files.
pub fn app_dir() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
    Ok(config_dir.join(APP_DIR))
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub secret: String,
    pub token_ttl: Duration,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), &app_dir()?)
    }

    /// Build from an arbitrary key lookup, resolving file defaults under `dir`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, dir: &Path) -> Result<Self> {
        let port = parse_or(&lookup, ENV_PORT, DEFAULT_PORT)?;
        let db_path = lookup(ENV_DB)
            .map(PathBuf::from)
            .unwrap_or_else(|| dir.join("notes.db"));
        let secret = match lookup(ENV_SECRET).filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None => load_or_create_secret(&dir.join("secret"))?,
        };
        let ttl_days: u64 = parse_or(&lookup, ENV_TOKEN_TTL_DAYS, DEFAULT_TOKEN_TTL_DAYS)?;

        Ok(Self {
            port,
            db_path,
            secret,
            token_ttl: days(ttl_days),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub session_path: PathBuf,
}

impl ClientConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), &app_dir()?)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, dir: &Path) -> Result<Self> {
        let api_url = lookup(ENV_API_URL).unwrap_or_else(|| {
            debug!("{ENV_API_URL} not set, using default: {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });
        url::Url::parse(&api_url)
            .with_context(|| format!("Invalid {ENV_API_URL} value: {api_url}"))?;

        Ok(Self {
            api_url,
            session_path: dir.join("session.json"),
        })
    }
}

pub fn days(n: u64) -> Duration {
    Duration::from_secs(n * 24 * 60 * 60)
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key} value '{raw}': {e}")),
        None => {
            debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// Read the token secret from `path`, generating and persisting one on first use.
pub fn load_or_create_secret(path: &Path) -> Result<String> {
    if path.exists() {
        let secret = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read secret from {}", path.display()))?;
        let secret = secret.trim().to_string();
        if !secret.is_empty() {
            return Ok(secret);
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let secret = generate_secret();
    write_private(path, &secret)?;
    debug!("Generated new token secret at {}", path.display());
    Ok(secret)
}

/// Write a file readable only by the current user.
pub fn write_private(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

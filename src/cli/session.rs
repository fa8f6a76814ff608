use anyhow::{bail, Result};

use super::ui;
use crate::auth::SignedTokenAuthenticator;
use crate::client::{Session, SessionStore};
use crate::config::{ClientConfig, ServerConfig};
use crate::models::OwnerId;

/// Execute the token command: sign a bearer token for `user` with the
/// server's secret.
pub fn run_token(config: &ServerConfig, user: &str) -> Result<()> {
    let Some(owner) = OwnerId::parse(user) else {
        bail!("User id cannot be empty.");
    };

    let authenticator = SignedTokenAuthenticator::new(config.secret.clone(), config.token_ttl);
    println!("{}", authenticator.issue(&owner));

    let days = config.token_ttl.as_secs() / (24 * 60 * 60);
    eprintln!("Valid for {} days on this server.", days);
    Ok(())
}

/// Execute the login command
pub fn run_login(config: &ClientConfig, token: &str, api_url: Option<&str>) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }

    let api_url = api_url.unwrap_or(&config.api_url);
    url::Url::parse(api_url)?;

    let store = SessionStore::new(config.session_path.clone());
    store.save(&Session::new(token, api_url))?;

    ui::status(&format!("Logged in to {}.", api_url));
    ui::status(&format!("Session saved to {}", store.path().display()));
    Ok(())
}

/// Execute the logout command
pub fn run_logout(config: &ClientConfig) -> Result<()> {
    let store = SessionStore::new(config.session_path.clone());
    if store.destroy()? {
        ui::status("Logged out.");
    } else {
        ui::status("Not logged in.");
    }
    Ok(())
}

//! Note commands: list, add, edit, archive, delete, stats.
//!
//! Each command loads the stored session once, builds a [`NoteController`]
//! around it, and talks to the server only through the controller.

use anyhow::{anyhow, bail, Result};
use tracing::warn;
use uuid::Uuid;

use super::display::{print_note, print_note_list, print_stats};
use super::ui;
use crate::client::gateway::GENERIC_FAILURE;
use crate::client::{ApiGateway, ClientError, NoteController, SessionStore};
use crate::config::ClientConfig;
use crate::models::Note;

/// A signed-in controller plus the store its session came from.
pub struct ClientContext {
    pub controller: NoteController,
    store: SessionStore,
}

impl ClientContext {
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let store = SessionStore::new(config.session_path.clone());
        let session = store
            .load()?
            .ok_or_else(|| anyhow!("Not logged in. Run 'notecmd login --token <token>'."))?;
        let gateway = ApiGateway::new(session.api_url.clone())?;

        Ok(Self {
            controller: NoteController::new(gateway, session),
            store,
        })
    }

    /// Fetch the notes matching `term` into the controller.
    pub async fn load(&mut self, term: &str) -> Result<()> {
        let result = self.controller.load(term).await;
        self.check(result)
    }

    /// Turn a client failure into a CLI error headed by the banner.
    /// A rejected token also ends the stored session.
    pub fn check<T>(&self, result: Result<T, ClientError>) -> Result<T> {
        result.map_err(|err| {
            if err.is_unauthorized() {
                match self.store.destroy() {
                    Ok(_) => ui::warning("Session is no longer valid. Log in again."),
                    Err(e) => warn!("Failed to remove session: {e}"),
                }
            }

            let banner = self.controller.error().unwrap_or(GENERIC_FAILURE).to_string();
            if banner == err.to_string() {
                anyhow::Error::new(err)
            } else {
                anyhow::Error::new(err).context(banner)
            }
        })
    }

    /// Resolve a full id or a unique id prefix among the loaded notes.
    pub fn resolve(&self, identifier: &str) -> Result<Uuid> {
        resolve_id(self.controller.notes(), identifier)
    }
}

pub fn resolve_id(notes: &[Note], identifier: &str) -> Result<Uuid> {
    let identifier = identifier.trim().to_lowercase();
    if identifier.is_empty() {
        bail!("Identifier cannot be empty.");
    }

    if let Ok(id) = Uuid::parse_str(&identifier) {
        return Ok(id);
    }

    let matches: Vec<Uuid> = notes
        .iter()
        .map(|n| n.id)
        .filter(|id| id.to_string().starts_with(&identifier))
        .collect();

    match matches.as_slice() {
        [] => bail!("No note found with ID: {}", identifier),
        [id] => Ok(*id),
        _ => bail!(
            "'{}' matches {} notes. Use more characters.",
            identifier,
            matches.len()
        ),
    }
}

/// Execute the list command
pub async fn run_list(config: &ClientConfig, search: Option<&str>, archived: bool) -> Result<()> {
    let mut ctx = ClientContext::open(config)?;
    let term = search.map(str::trim).unwrap_or("");
    ctx.load(term).await?;

    if archived {
        print_note_list(&ctx.controller.archived(), "Archived", term);
    } else {
        print_note_list(&ctx.controller.active(), "Notes", term);
    }
    Ok(())
}

/// Execute the add command, prompting for whatever was not given.
pub async fn run_add(
    config: &ClientConfig,
    title: Option<String>,
    content: Option<String>,
) -> Result<()> {
    let mut ctx = ClientContext::open(config)?;

    let Some(title) = value_or_prompt(title, "title:", None)? else {
        return Ok(());
    };
    let Some(content) = value_or_prompt(content, "content:", None)? else {
        return Ok(());
    };

    let result = ctx.controller.create(&title, &content).await.cloned();
    let note = ctx.check(result)?;

    println!();
    print_note(&note);
    ui::status("\nSaved.");
    Ok(())
}

/// Execute the edit command. Prompts default to the current values.
pub async fn run_edit(
    config: &ClientConfig,
    identifier: &str,
    title: Option<String>,
    content: Option<String>,
) -> Result<()> {
    let mut ctx = ClientContext::open(config)?;
    ctx.load("").await?;
    let id = ctx.resolve(identifier)?;
    let current = ctx
        .controller
        .note(id)
        .cloned()
        .ok_or_else(|| anyhow!("No note found with ID: {}", id))?;

    let Some(title) = value_or_prompt(title, "title:", Some(&current.title))? else {
        return Ok(());
    };
    let Some(content) = value_or_prompt(content, "content:", Some(&current.content))? else {
        return Ok(());
    };

    if title == current.title && content == current.content {
        ui::status("No changes.");
        return Ok(());
    }

    let result = ctx.controller.edit(id, &title, &content).await.cloned();
    let note = ctx.check(result)?;

    println!();
    print_note(&note);
    ui::status("\nSaved.");
    Ok(())
}

/// Execute the archive and unarchive commands
pub async fn run_archive(config: &ClientConfig, identifier: &str, archived: bool) -> Result<()> {
    let mut ctx = ClientContext::open(config)?;
    ctx.load("").await?;
    let id = ctx.resolve(identifier)?;

    let current = ctx
        .controller
        .note(id)
        .map(|n| n.archived)
        .ok_or_else(|| anyhow!("No note found with ID: {}", id))?;
    if current == archived {
        ui::status(if archived { "Already archived." } else { "Not archived." });
        return Ok(());
    }

    let toggled = ctx.controller.toggle_archive(id);
    let request = ctx.check(toggled)?;
    let response = request.send().await;
    let result = ctx.controller.reconcile_archive(response);
    ctx.check(result)?;

    ui::status(if archived { "Archived." } else { "Unarchived." });
    Ok(())
}

/// Execute the delete command
pub async fn run_delete(config: &ClientConfig, identifier: &str, force: bool) -> Result<()> {
    let mut ctx = ClientContext::open(config)?;
    ctx.load("").await?;
    let id = ctx.resolve(identifier)?;

    if !force {
        let prompt = match ctx.controller.note(id) {
            Some(note) => format!("Delete \"{}\"?", ui::truncate(&note.title, 40)),
            None => format!("Delete note {}?", id),
        };
        if !ui::confirm(&prompt).unwrap_or(false) {
            return Ok(());
        }
    }

    let result = ctx.controller.delete(id).await;
    ctx.check(result)?;

    ui::status("Deleted.");
    Ok(())
}

/// Execute the stats command
pub async fn run_stats(config: &ClientConfig) -> Result<()> {
    let mut ctx = ClientContext::open(config)?;
    ctx.load("").await?;
    print_stats(&ctx.controller.stats());
    Ok(())
}

/// `Some(value)` from the flag or the prompt, `None` if the prompt was skipped.
fn value_or_prompt(
    value: Option<String>,
    prompt: &str,
    default: Option<&str>,
) -> Result<Option<String>> {
    match value {
        Some(v) => Ok(Some(v)),
        None => ui::text_input(prompt, default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteDraft, OwnerId};

    fn notes(n: usize) -> Vec<Note> {
        let owner = OwnerId::parse("alice").unwrap();
        (0..n)
            .map(|_| Note::new(owner.clone(), NoteDraft::new("t", "c").unwrap()))
            .collect()
    }

    #[test]
    fn test_resolve_full_id() {
        let notes = notes(1);
        let id = notes[0].id;
        assert_eq!(resolve_id(&notes, &id.to_string()).unwrap(), id);
        assert_eq!(
            resolve_id(&notes, &id.to_string().to_uppercase()).unwrap(),
            id
        );
    }

    #[test]
    fn test_resolve_prefix() {
        let notes = notes(1);
        let id = notes[0].id;
        let prefix: String = id.to_string().chars().take(6).collect();
        assert_eq!(resolve_id(&notes, &prefix).unwrap(), id);
    }

    #[test]
    fn test_resolve_rejects_empty_and_unknown() {
        let notes = notes(2);
        assert!(resolve_id(&notes, "  ").is_err());
        assert!(resolve_id(&notes, "zzzz").is_err());
    }

    #[test]
    fn test_resolve_ambiguous_prefix() {
        let mut notes = notes(2);
        notes[0].id = Uuid::parse_str("abcd0000-0000-4000-8000-000000000001").unwrap();
        notes[1].id = Uuid::parse_str("abcd0000-0000-4000-8000-000000000002").unwrap();

        let err = resolve_id(&notes, "abcd").unwrap_err();
        assert!(err.to_string().contains("matches 2 notes"));
        assert_eq!(
            resolve_id(&notes, "ABCD0000-0000-4000-8000-000000000002").unwrap(),
            notes[1].id
        );
    }
}

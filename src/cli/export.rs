use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::notes::ClientContext;
use super::ui;
use crate::config::ClientConfig;
use crate::models::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Serialize)]
struct NotesDocument<'a> {
    notes: &'a [Note],
}

/// One CSV line per note.
#[derive(Serialize)]
struct ExportRow<'a> {
    id: String,
    title: &'a str,
    content: &'a str,
    created_at: String,
    updated_at: String,
    archived: bool,
}

impl<'a> From<&'a Note> for ExportRow<'a> {
    fn from(note: &'a Note) -> Self {
        Self {
            id: note.id.to_string(),
            title: &note.title,
            content: &note.content,
            created_at: note.created_at.to_rfc3339(),
            updated_at: note.updated_at.to_rfc3339(),
            archived: note.archived,
        }
    }
}

/// Execute the export command
pub async fn run_export(config: &ClientConfig, path: &str, format: ExportFormat) -> Result<()> {
    let mut ctx = ClientContext::open(config)?;
    ctx.load("").await?;

    let notes = ctx.controller.notes();
    export_to_path(notes, Path::new(path), format)?;

    ui::status(&format!("Exported {} notes to {}", notes.len(), path));
    Ok(())
}

pub fn export_to_path(notes: &[Note], path: &Path, format: ExportFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Json => write_json(notes, &mut writer)?,
        ExportFormat::Csv => write_csv(notes, &mut writer)?,
    }

    writer.flush()?;
    Ok(())
}

/// `{ "notes": [...] }`, pretty-printed.
pub fn write_json<W: Write>(notes: &[Note], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, &NotesDocument { notes })?;
    Ok(())
}

pub fn write_csv<W: Write>(notes: &[Note], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for note in notes {
        csv_writer.serialize(ExportRow::from(note))?;
    }
    csv_writer.flush()?;
    Ok(())
}

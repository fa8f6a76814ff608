use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike, Utc};

use super::ui::{single_line, term_width, truncate};
use crate::models::{Note, NoteStats};

/// Characters of the id shown in listings; enough to address a note.
pub const SHORT_ID_LEN: usize = 8;

pub fn short_id(note: &Note) -> String {
    note.id.to_string().chars().take(SHORT_ID_LEN).collect()
}

/// Print a list of notes, or the empty-state hint.
pub fn print_note_list(notes: &[&Note], heading: &str, search: &str) {
    if notes.is_empty() {
        if search.is_empty() {
            println!("No notes yet. Run 'notecmd add' to get started.");
        } else {
            println!("No notes found matching your search.");
        }
        return;
    }

    println!("{} ({})\n", heading, notes.len());
    let width = term_width();
    for note in notes {
        print_note_summary(note, width);
    }
}

/// Two lines per note: id and title, then a one-line content preview.
pub fn print_note_summary(note: &Note, width: usize) {
    let title_width = width.saturating_sub(SHORT_ID_LEN + 2).max(10);
    println!("{}  {}", short_id(note), truncate(&note.title, title_width));
    let preview_width = width.saturating_sub(SHORT_ID_LEN + 2).max(10);
    println!(
        "{:indent$}{}",
        "",
        truncate(&single_line(&note.content), preview_width),
        indent = SHORT_ID_LEN + 2
    );
}

/// Print a full note with dates
pub fn print_note(note: &Note) {
    println!("{}\n", note.title);
    for line in note.content.lines() {
        println!("  {}", line);
    }
    println!();
    println!("  {}", format_dates(note, Local::now()));
    if note.archived {
        println!("  archived");
    }
    println!("  {}", note.id);
}

pub fn print_stats(stats: &NoteStats) {
    println!("notes     {}", stats.total);
    println!("active    {}", stats.total - stats.archived);
    println!("archived  {}", stats.archived);
    println!("avg len   {} chars", stats.average_length);
}

/// "Created … · updated …", omitting the update when it equals creation.
pub fn format_dates(note: &Note, now: DateTime<Local>) -> String {
    let created = format_date(&note.created_at, now);
    if note.updated_at == note.created_at {
        format!("Created {}", created)
    } else {
        format!(
            "Created {} · updated {}",
            created,
            format_date(&note.updated_at, now)
        )
    }
}

/// Format a timestamp relative to `now`: time only for today, "Yesterday",
/// month and day this year, full date otherwise.
pub fn format_date(date: &DateTime<Utc>, now: DateTime<Local>) -> String {
    let date = date.with_timezone(&Local);
    let today = now.date_naive();
    let day = date.date_naive();
    let time = format!(
        "{}:{:02}{}",
        date.hour12().1,
        date.minute(),
        if date.hour12().0 { "pm" } else { "am" }
    );

    if day == today {
        format!("Today at {}", time)
    } else if Some(day) == today.pred_opt() {
        format!("Yesterday at {}", time)
    } else if day.year() == today.year() {
        format!("{} {} at {}", month_abbrev(&day), day.day(), time)
    } else {
        format!("{} {}, {} at {}", month_abbrev(&day), day.day(), day.year(), time)
    }
}

fn month_abbrev(day: &NaiveDate) -> &'static str {
    match day.month() {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "???",
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod display;
pub mod export;
pub mod notes;
pub mod serve;
pub mod session;
pub mod ui;

pub use export::{run_export, ExportFormat};
pub use notes::{run_add, run_archive, run_delete, run_edit, run_list, run_stats};
pub use serve::run_serve;
pub use session::{run_login, run_logout, run_token};

#[derive(Parser)]
#[command(name = "notecmd")]
#[command(about = "Personal notes server and command-line client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the notes REST server
    Serve(ServeArgs),
    /// Mint a bearer token for a user with the server secret
    Token(TokenArgs),
    /// Store a session token for the client commands
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// List active notes, or archived ones with --archived
    List(ListArgs),
    /// Add a new note
    Add(AddArgs),
    /// Edit a note's title and content
    Edit(EditArgs),
    /// Move a note to the archive
    Archive(IdArgs),
    /// Restore an archived note
    Unarchive(IdArgs),
    /// Delete a note
    Delete(DeleteArgs),
    /// Export all notes to a file
    Export(ExportArgs),
    /// Show note counts and average length
    Stats,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(short, long)]
    pub port: Option<u16>,
    /// SQLite database file
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Args)]
pub struct TokenArgs {
    /// Owner id the token is issued for
    #[arg(short, long)]
    pub user: String,
}

#[derive(Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub token: String,
    /// API base URL, e.g. http://localhost:5000/api
    #[arg(long)]
    pub api_url: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only notes whose title or content contains this text
    #[arg(short, long)]
    pub search: Option<String>,
    #[arg(short, long)]
    pub archived: bool,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub content: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Note id or unique id prefix
    pub id: String,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub content: Option<String>,
}

#[derive(Args)]
pub struct IdArgs {
    /// Note id or unique id prefix
    pub id: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Note id or unique id prefix
    pub id: String,
    /// Skip confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file
    pub path: String,
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
    pub format: ExportFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_flags() {
        let cli =
            Cli::try_parse_from(["notecmd", "list", "--search", "milk", "--archived"]).unwrap();
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.search.as_deref(), Some("milk"));
                assert!(args.archived);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_export_format() {
        let cli = Cli::try_parse_from(["notecmd", "export", "out.csv", "-f", "csv"]).unwrap();
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.path, "out.csv");
                assert_eq!(args.format, ExportFormat::Csv);
            }
            _ => panic!("expected export"),
        }

        assert!(Cli::try_parse_from(["notecmd", "export", "out.xml", "-f", "xml"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

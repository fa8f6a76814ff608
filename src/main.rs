use clap::Parser;
use notecmd::cli::{
    run_add, run_archive, run_delete, run_edit, run_export, run_list, run_login, run_logout,
    run_serve, run_stats, run_token, ui, Cli, Commands,
};
use notecmd::config::{ClientConfig, ServerConfig};
use notecmd::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let directives = match cli.command {
        Commands::Serve(_) => logging::SERVER_DIRECTIVES,
        _ => logging::CLI_DIRECTIVES,
    };
    logging::init(directives);

    if let Err(e) = run(cli.command).await {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Serve(args) => {
            run_serve(ServerConfig::load()?, args.port, args.db).await?;
        }
        Commands::Token(args) => {
            run_token(&ServerConfig::load()?, &args.user)?;
        }
        Commands::Login(args) => {
            run_login(&ClientConfig::load()?, &args.token, args.api_url.as_deref())?;
        }
        Commands::Logout => {
            run_logout(&ClientConfig::load()?)?;
        }
        Commands::List(args) => {
            run_list(&ClientConfig::load()?, args.search.as_deref(), args.archived).await?;
        }
        Commands::Add(args) => {
            run_add(&ClientConfig::load()?, args.title, args.content).await?;
        }
        Commands::Edit(args) => {
            run_edit(&ClientConfig::load()?, &args.id, args.title, args.content).await?;
        }
        Commands::Archive(args) => {
            run_archive(&ClientConfig::load()?, &args.id, true).await?;
        }
        Commands::Unarchive(args) => {
            run_archive(&ClientConfig::load()?, &args.id, false).await?;
        }
        Commands::Delete(args) => {
            run_delete(&ClientConfig::load()?, &args.id, args.force).await?;
        }
        Commands::Export(args) => {
            run_export(&ClientConfig::load()?, &args.path, args.format).await?;
        }
        Commands::Stats => {
            run_stats(&ClientConfig::load()?).await?;
        }
    }

    Ok(())
}

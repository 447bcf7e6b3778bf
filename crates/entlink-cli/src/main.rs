use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use entlink_cli::{
    cli::{Cli, Commands},
    commands, config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = match cli.level_filter() {
        Some(level) => EnvFilter::new(format!(
            "entlink_cli={level},entlink_core={level},entlink_config={level}"
        )),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("entlink_cli=warn,entlink_core=warn,entlink_config=warn")
        }),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search { query, format } => {
            let settings = config::load(cli.config).await?;
            commands::search::execute(settings, query, format).await?
        }

        Commands::Link {
            selection,
            pick,
            no_open,
        } => {
            let settings = config::load(cli.config).await?;
            commands::link::execute_selection(settings, cli.vault, selection, pick, no_open)
                .await?
        }

        Commands::LinkNote { path, pick } => {
            let settings = config::load(cli.config).await?;
            commands::link::execute_note(settings, cli.vault, path, pick).await?
        }

        Commands::Config(cmd) => commands::config::execute(cli.config, cmd).await?,
    }

    Ok(())
}

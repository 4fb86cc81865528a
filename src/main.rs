use clap::Parser;
use color_eyre::Result;
use daily_planner::{
    cli::{self, Cli, Commands},
    logging, Config, Profile,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev switches to separate config and data directories
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_with_profile(profile)?,
    };
    logging::init(&config);

    match cli.command {
        Commands::Serve { bind } => cli::handle_serve(&config, bind).await?,
        Commands::Session { action } => cli::handle_session(&config, action)?,
        Commands::Theme { action } => cli::handle_theme(&config, action)?,
        Commands::Tasks { remote, action } => cli::handle_tasks(&config, remote, action).await?,
        Commands::Rules { remote, action } => cli::handle_rules(&config, remote, action).await?,
        Commands::Note { remote, action } => cli::handle_note(&config, remote, action).await?,
        Commands::Goal { remote, action } => cli::handle_goal(&config, remote, action).await?,
        Commands::Stats { remote, today } => cli::handle_stats(&config, remote, today).await?,
        Commands::Whoami { remote } => cli::handle_whoami(&config, remote).await?,
    }

    Ok(())
}

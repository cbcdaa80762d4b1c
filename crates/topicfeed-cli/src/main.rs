use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use topicfeed_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "topicfeed")]
#[command(author, version, about = "Aggregate RSS/Atom feeds into one topic feed")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (defaults to ~/.config/topicfeed/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all feeds and print the merged article list
    Fetch {
        /// Maximum number of articles (defaults to general.max_items)
        #[arg(short = 'm', long)]
        max: Option<usize>,
        /// Print articles as JSON
        #[arg(long)]
        json: bool,
    },
    /// List configured feeds
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_from(&config_path)?;

    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if !config_path.exists() {
        tracing::debug!("No config at {}, using defaults", config_path.display());
    }

    match cli.command {
        Some(Commands::Fetch { max, json }) => commands::fetch::run(&config, max, json).await,
        None => commands::fetch::run(&config, None, false).await,
        Some(Commands::List) => commands::list::run(&config),
    }
}

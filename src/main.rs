use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{BootstrapCommand, ConfigCommand, SyncCommand};
use hevymirror::config::Config;
use hevymirror::db::{init_db, RelationalMirror};

#[derive(Parser)]
#[command(name = "hevymirror")]
#[command(version)]
#[command(about = "Mirror a Hevy workout account into a local SQLite database", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the full workout history and exercise templates
    Bootstrap(BootstrapCommand),

    /// Apply remote changes since the last sync
    Sync(SyncCommand),

    /// Show mirror row counts and sync cursor
    Status,

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hevymirror=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Bootstrap(cmd)) => {
            let mut mirror = open_mirror(&config).await?;
            cmd.run(&mut mirror, &config).await?;
        }
        Some(Commands::Sync(cmd)) => {
            let mut mirror = open_mirror(&config).await?;
            cmd.run(&mut mirror, &config).await?;
        }
        Some(Commands::Status) => {
            let mirror = open_mirror(&config).await?;
            commands::status::show(&mirror).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

async fn open_mirror(config: &Config) -> Result<RelationalMirror, Box<dyn std::error::Error>> {
    let pool = init_db(&config.database_path.value).await?;
    tracing::debug!("Opened mirror at {}", config.database_path.value.display());
    Ok(RelationalMirror::open(pool).await?)
}

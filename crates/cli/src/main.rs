//! Fieldhand CLI: the main entry point.
//!
//! Commands:
//! - `onboard`  : write the default config file
//! - `init-db`  : create the farm schema and import CSV data
//! - `chat`     : interactive or single-message chat with the farm assistant
//! - `doctor`   : diagnose configuration, database and API keys

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fieldhand",
    about = "Fieldhand: ask questions about your farm's crops, wages and weather",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Create the farm tables and import CSV data
    InitDb {
        /// CSV file with crop yields
        #[arg(long)]
        crops: Option<PathBuf>,

        /// CSV file with employee wages
        #[arg(long)]
        wages: Option<PathBuf>,
    },

    /// Chat with the farm assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Print the transcript as JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::InitDb { crops, wages } => commands::init_db::run(crops, wages).await?,
        Commands::Chat { message, json } => commands::chat::run(message, json).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

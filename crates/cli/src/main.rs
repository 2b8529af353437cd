//! strata CLI — the main entry point.
//!
//! Commands:
//! - `chat`   — Interactive session or single-message mode
//! - `ingest` — Sync the docs folder into the semantic vault
//! - `status` — Show store counts and configuration

use clap::{Parser, Subcommand};

mod commands;
mod persona;

#[derive(Parser)]
#[command(
    name = "strata",
    about = "strata — tiered-memory conversational agent",
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
    /// Chat with the agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Sync the docs folder into the semantic vault
    Ingest,

    /// Show store counts and configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Ingest => commands::ingest::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}

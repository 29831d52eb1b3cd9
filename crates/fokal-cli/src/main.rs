//! Operator CLI for the Fokal mutation core
//!
//! Replays request scenarios against in-memory stores and checks
//! configuration files.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fokal_cli::{load_config, replay, Scenario};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fokal")]
#[command(about = "Fokal - gated link and tag mutation core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "fokal.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed in-memory stores from a scenario file and replay its requests
    Replay {
        /// Scenario JSON file
        scenario: PathBuf,
    },

    /// Print the effective configuration after env overrides and validation
    CheckConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    // Outcomes go to stdout, logs to stderr
    let log_level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay { scenario } => {
            let scenario = Scenario::load(&scenario)?;
            for line in replay(&scenario, &config).await? {
                println!("{}", serde_json::to_string(&line)?);
            }
        }

        Commands::CheckConfig => {
            tracing::info!(path = %cli.config.display(), "config ok");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

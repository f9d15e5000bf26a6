//! Raven CLI - image variant generation.
//!
//! Raven takes uploaded images and writes resized WebP and PNG variants
//! (or untouched copies of animated GIFs), then prints a manifest of where
//! every variant landed and its MD5 digest.
//!
//! # Usage
//!
//! ```bash
//! # Generate the generic ladder for one photo
//! raven process photo.jpg
//!
//! # Avatar sizes, written under a scratch directory, as JSON Lines
//! raven process face.png --kind avatar --base-dir /tmp/content --format jsonl
//!
//! # View configuration
//! raven config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Raven - image variant generation.
#[derive(Parser, Debug)]
#[command(name = "raven")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "RAVEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate variants for one upload of image files
    Process(cli::process::ProcessArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't up yet, so config warnings go straight to stderr.
    let loaded = match &cli.config {
        Some(path) => raven_core::Config::load_from(path),
        None => raven_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `raven config path`."
            );
            raven_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Raven v{}", raven_core::VERSION);

    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config).await,
    }
}

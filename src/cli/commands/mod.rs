//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod harvest;
mod serve;
mod sources;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "jobharvest")]
#[command(about = "Multi-source job posting harvester")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ./jobharvest.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run one harvest and print the summary
    Harvest {
        /// Search query (defaults to the configured occupation term)
        #[arg(short, long)]
        query: Option<String>,
        /// Pages per source
        #[arg(short, long)]
        pages: Option<u32>,
        /// Source to harvest (repeatable; all known sources if omitted)
        #[arg(short, long = "source")]
        sources: Vec<String>,
        /// Keep results in memory instead of sending them to the document store
        #[arg(long)]
        no_store: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Bind host (overrides HOST and the config file)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides PORT and the config file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// List known sources
    Sources {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Harvest {
            query,
            pages,
            sources,
            no_store,
            json,
        } => {
            harvest::cmd_harvest(
                &settings,
                harvest::HarvestArgs {
                    query,
                    pages,
                    sources,
                    no_store,
                    json,
                },
            )
            .await
        }
        Commands::Serve { host, port } => serve::cmd_serve(settings, host, port).await,
        Commands::Sources { json } => sources::cmd_sources(json),
    }
}

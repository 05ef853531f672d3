//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod fetch;
mod helpers;
mod init;
mod logs;
mod rankings;
mod serve;
mod sites;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "booklist")]
#[command(about = "Daily novel ranking acquisition and query service")]
#[command(version)]
pub struct Cli {
    /// Data directory (overrides config file)
    #[arg(long, global = true, env = "BOOKLIST_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
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
    /// Create the database and register the configured sites
    Init,

    /// Run one ingestion pass
    Fetch {
        /// Site codes to fetch (default: every active site)
        site_codes: Vec<String>,
        /// Date to record the snapshot under (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Start the read API
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default from config, 127.0.0.1:8000)
        #[arg(long)]
        bind: Option<String>,
    },

    /// List configured sites and their ranking types
    Sites,

    /// Print stored rankings as JSON
    Rankings {
        /// Site code (omit for an overview of every site)
        site_code: Option<String>,
        /// Ranking type code within the site
        type_code: Option<String>,
        /// Date to read (YYYY-MM-DD, default: today, falls back to latest)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show recent fetch logs
    Logs {
        /// Only show logs for this site
        #[arg(long)]
        site: Option<String>,
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };
    let (settings, _config) = load_settings_with_options(options)
        .await
        .map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Fetch { site_codes, date } => {
            fetch::cmd_fetch(&settings, &site_codes, date.as_deref()).await
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::Sites => sites::cmd_sites(&settings).await,
        Commands::Rankings {
            site_code,
            type_code,
            date,
        } => {
            rankings::cmd_rankings(
                &settings,
                site_code.as_deref(),
                type_code.as_deref(),
                date.as_deref(),
            )
            .await
        }
        Commands::Logs { site, limit } => logs::cmd_logs(&settings, site.as_deref(), limit).await,
    }
}

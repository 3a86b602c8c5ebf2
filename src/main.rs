//! Tululu-Downloader main entry point
//!
//! This is the command-line interface for the Tululu-Downloader book downloader.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tululu_downloader::config::{load_config_with_hash, Config};
use tululu_downloader::crawler::{download, Selection};
use tululu_downloader::output::print_statistics;
use tracing_subscriber::EnvFilter;

/// Tululu-Downloader: downloads books from tululu.org
///
/// Saves each book's text, cover image and reader comments into local folders and
/// records the book descriptions in a JSON file.
#[derive(Parser, Debug)]
#[command(name = "tululu-downloader")]
#[command(version)]
#[command(about = "Download books from tululu.org", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Folder all downloads are written under
    #[arg(long, value_name = "DIR", global = true)]
    dest_folder: Option<PathBuf>,

    /// JSON file for book descriptions, relative to the destination folder
    #[arg(long, value_name = "FILE", global = true)]
    json_path: Option<PathBuf>,

    /// Do not write the book descriptions JSON file
    #[arg(long, conflicts_with = "json_path", global = true)]
    no_json: bool,

    /// Do not download cover images
    #[arg(long, global = true)]
    skip_imgs: bool,

    /// Do not download book texts
    #[arg(long, global = true)]
    skip_txt: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download books by identifier range (inclusive)
    Range {
        /// First book identifier
        #[arg(value_name = "START_ID", default_value_t = 1)]
        start_id: u32,

        /// Last book identifier
        #[arg(value_name = "END_ID", default_value_t = 10)]
        end_id: u32,
    },

    /// Download every book listed on the given catalog pages
    Category {
        /// Catalog page numbers
        #[arg(value_name = "PAGES", required = true, num_args = 1..)]
        pages: Vec<u32>,
    },
}

impl Command {
    fn selection(&self) -> Selection {
        match self {
            Command::Range { start_id, end_id } => Selection::Range {
                start_id: *start_id,
                end_id: *end_id,
            },
            Command::Category { pages } => Selection::Pages(pages.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;
    let selection = cli.command.selection();

    tracing::info!(
        "Saving into {} (retry: {} attempts, {}s delay)",
        config.output.dest_folder.display(),
        config.retry.max_attempts,
        config.retry.delay_seconds
    );

    let stats = match download(config, &selection).await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!("Download failed: {}", e);
            return Err(e.into());
        }
    };

    if !cli.quiet {
        print_statistics(&stats);
    }

    Ok(())
}

/// Loads the configuration file, if any, and applies command-line overrides
fn load(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(dest_folder) = &cli.dest_folder {
        config.output.dest_folder = dest_folder.clone();
    }
    if cli.no_json {
        config.output.json_path = None;
    } else if let Some(json_path) = &cli.json_path {
        config.output.json_path = Some(json_path.clone());
    }
    config.output.skip_imgs |= cli.skip_imgs;
    config.output.skip_txt |= cli.skip_txt;

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tululu_downloader=info,warn"),
            1 => EnvFilter::new("tululu_downloader=debug,info"),
            2 => EnvFilter::new("tululu_downloader=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

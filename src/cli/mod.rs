//! CLI parser and command dispatch.

mod browse;
mod helpers;
mod scrape;
mod serve;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use novelscrape::config::{Config, FetchMode};

#[derive(Parser)]
#[command(name = "novelscrape")]
#[command(about = "Scrape web novels from supported reading sites")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// How pages are fetched (overrides scraper.fetch_mode)
    #[arg(long, global = true, value_enum)]
    fetch_mode: Option<FetchMode>,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// List registered sources
    Sources,

    /// Search a source for novels
    Search {
        /// Source ID
        source_id: String,
        /// Search text
        query: String,
    },

    /// Show novel metadata
    Novel {
        /// Source ID
        source_id: String,
        /// Novel page URL
        url: String,
    },

    /// List chapter URLs of a novel
    Chapters {
        /// Source ID
        source_id: String,
        /// Novel page URL
        url: String,
    },

    /// Fetch a single chapter
    Chapter {
        /// Source ID
        source_id: String,
        /// Chapter page URL
        url: String,
    },

    /// Scrape a novel and all of its chapters
    Scrape {
        /// Source ID
        source_id: String,
        /// Novel page URL
        url: String,
        /// Maximum simultaneous chapter fetches
        #[arg(long)]
        concurrency: Option<usize>,
        /// Write the JSON result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP API server
    Serve {
        /// Address to bind to (default from config: 127.0.0.1)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (default from config: 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    if let Some(mode) = cli.fetch_mode {
        config.scraper.fetch_mode = mode;
    }

    match cli.command {
        Commands::Sources => browse::cmd_sources(&config),
        Commands::Search { source_id, query } => {
            browse::cmd_search(&config, &source_id, &query).await
        }
        Commands::Novel { source_id, url } => browse::cmd_novel(&config, &source_id, &url).await,
        Commands::Chapters { source_id, url } => {
            browse::cmd_chapters(&config, &source_id, &url).await
        }
        Commands::Chapter { source_id, url } => {
            browse::cmd_chapter(&config, &source_id, &url).await
        }
        Commands::Scrape {
            source_id,
            url,
            concurrency,
            output,
        } => scrape::cmd_scrape(&config, &source_id, &url, concurrency, output.as_deref()).await,
        Commands::Serve { host, port } => serve::cmd_serve(&config, host, port).await,
    }
}

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newswire")]
#[command(about = "RSS ingestion pipeline with a news query API and bus bridge", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/newswire/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pollers, the query API and the bus bridge until interrupted
    Serve {
        /// Override the polling interval (e.g., "30m", "1h", "90s")
        #[arg(short, long)]
        interval: Option<String>,

        /// Read bridge input paths from stdin, one per line
        #[arg(long)]
        stdin_bus: bool,

        /// Bridge queries go to this API over HTTP instead of in-process
        /// (e.g., "http://127.0.0.1:3000/")
        #[arg(long)]
        api_base: Option<String>,
    },
    /// Poll every configured source once
    Update,
    /// Show a page of the most recently published articles
    List {
        /// How many of the most recent articles to page over
        #[arg(short, default_value_t = 10)]
        n: i64,

        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },
    /// Search article text, case-insensitively
    Search {
        text: String,

        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scrape episodic video catalogs from the command line
#[derive(Parser)]
#[command(name = "episodic")]
#[command(about = "Browse catalogs, playlists and streams of the built-in sources", long_about = None)]
pub struct Cli {
    /// Config file (defaults to the per-user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered sources and what they support
    Sources,
    /// Fetch one catalog page
    Catalog {
        source: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Category label, see `filters`
        #[arg(short, long)]
        category: Option<String>,
        /// Year label, see `filters`
        #[arg(short, long)]
        year: Option<String>,
    },
    /// Playlists and metadata of one title
    Detail {
        source: String,
        id: String,
    },
    /// Resolve a play page into a stream
    Video {
        source: String,
        play_url: String,
    },
    /// Home page sections
    Home {
        source: String,
    },
    /// Category and year labels a source accepts
    Filters {
        source: String,
    },
}

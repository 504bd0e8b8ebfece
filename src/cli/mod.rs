pub mod commands;

use clap::{Parser, Subcommand};

use crate::domain::{ItemId, StoryFilter};

#[derive(Parser)]
#[command(name = "hnwire")]
#[command(about = "Resolve forum items, threads and link previews", long_about = None)]
pub struct Cli {
    /// Path to a config file (default: ~/.config/hnwire/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Number of parallel workers for loading items
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a single item
    Item {
        id: ItemId,
    },
    /// Show a user profile
    User {
        username: String,
    },
    /// List stories
    Stories {
        #[arg(short, long, value_enum, default_value_t = StoryFilter::Top)]
        filter: StoryFilter,

        /// Skip this many stories
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Show at most this many stories
        #[arg(short, long, default_value_t = 30)]
        limit: usize,
    },
    /// Show the ancestors of a comment, root first
    Parents {
        /// Id of the comment
        id: ItemId,
    },
    /// Extract favicon, preview image and site name from a page
    Metadata {
        url: String,
    },
}

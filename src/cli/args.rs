//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rescache - Consistent on-disk cache for remote resources.
#[derive(Debug, Parser)]
#[command(name = "rescache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides ~/.rescache/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Cache directory (overrides config and RESCACHE_DIR)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List cached entries
    List(ListArgs),

    /// Show one cached entry
    Show(ShowArgs),

    /// Fetch a resource through the cache
    Fetch(FetchArgs),

    /// Remove one cached entry
    Invalidate(InvalidateArgs),

    /// Remove all cached entries
    Clear(ClearArgs),

    /// Show cache statistics
    Stats,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed information
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for the `show` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ShowArgs {
    /// Cache key (usually the resource URL)
    pub key: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `fetch` command.
#[derive(Debug, Clone, clap::Args)]
pub struct FetchArgs {
    /// Resource URL; also used as the cache key
    pub url: String,

    /// Maximum age of a cached copy (e.g. 30m, 24h, 7d)
    #[arg(long, value_name = "TTL")]
    pub max_age: Option<String>,

    /// Check the remote for changes even when the cached copy is young enough
    #[arg(long)]
    pub revalidate: bool,
}

/// Arguments for the `invalidate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InvalidateArgs {
    /// Cache key to remove
    pub key: String,
}

/// Arguments for the `clear` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ClearArgs {
    /// Don't prompt for confirmation
    #[arg(short, long)]
    pub force: bool,
}

//! Command-line argument parsing for `dox`, built with `clap`'s derive API.
//!
//! Global flags (`--config`, `--json`, `--no-color`) apply to every
//! subcommand; everything else is scoped to the subcommand it belongs to,
//! per spec.md §6's external-interface table.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Local documentation cache and search tool.
#[derive(Debug, Parser)]
#[command(name = "dox", version, about, long_about = None)]
pub struct Cli {
    /// Path to an explicit `dox.toml`/`.dox.toml`; otherwise discovered by
    /// walking up from the current directory.
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output, regardless of `NO_COLOR`.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Increase log verbosity (info-level); repeat for debug.
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output rendering format shared across read commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
#[value(rename_all = "lowercase")]
pub enum Format {
    /// Aligned column output (the default).
    #[default]
    Table,
    /// A single JSON array.
    Json,
    /// Comma-separated values.
    Csv,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Syncs one or more configured sources, or all of them if none are named.
    Sync {
        /// Source names to sync; omit to sync every configured source.
        names: Vec<String>,
        /// Bypass conditional-fetch short-circuiting.
        #[arg(short, long)]
        force: bool,
        /// Compute diffs and hit the network, but write nothing to disk.
        #[arg(long)]
        dry_run: bool,
        /// Remove the output root before syncing.
        #[arg(long)]
        clean: bool,
        /// Maximum number of sources synced concurrently.
        #[arg(short, long)]
        parallel: Option<usize>,
    },
    /// Lists every collection in the manifest.
    List {
        #[arg(short = 'f', long, value_enum)]
        format: Option<Format>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Lists every collection in the manifest (alias for `list`).
    Collections {
        #[arg(short = 'f', long, value_enum)]
        format: Option<Format>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Lists the files within one collection.
    Files {
        /// Collection (source) name.
        collection: String,
        #[arg(short = 'f', long, value_enum)]
        format: Option<Format>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Prints a cached file's contents.
    Cat {
        /// Collection (source) name.
        collection: String,
        /// File path, relative to the collection's output subdirectory.
        file: String,
        /// Prefix every line with its 1-based line number.
        #[arg(long)]
        line_numbers: bool,
    },
    /// Searches cached documentation.
    Search {
        /// The search query.
        query: String,
        /// Restrict the search to one collection.
        #[arg(long)]
        collection: Option<String>,
        /// Search file contents instead of metadata (path/description/headings/exports).
        #[arg(long)]
        content: bool,
        /// Treat `query` as a regular expression (only meaningful with `--content`).
        #[arg(long)]
        regex: bool,
        #[arg(short = 'f', long, value_enum)]
        format: Option<Format>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Adds a new source to the configuration file.
    Add {
        /// Stable source name.
        name: String,
        /// Direct URL to fetch; mutually exclusive with `--repo`.
        #[arg(long)]
        url: Option<String>,
        /// `owner/repo` slug to sync from; mutually exclusive with `--url`.
        #[arg(long)]
        repo: Option<String>,
        /// Branch, tag, or commit (repository sources only).
        #[arg(long = "ref")]
        git_ref: Option<String>,
        /// Path rooted in the repository (repository sources only).
        #[arg(long)]
        path: Option<String>,
    },
    /// Removes the output root: cached files, lock, and manifest.
    Clean,
    /// Writes a starter `dox.toml` in the current directory.
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

//! # dox-core
//!
//! Core functionality for dox — a local documentation cache and search tool.
//!
//! This crate syncs documentation from GitHub repositories and plain URLs into
//! a local, content-addressed cache, builds a structured manifest describing
//! every cached file (headings, exports, descriptions), and supports fuzzy
//! metadata search and streamed content grep against that cache.
//!
//! ## Architecture
//!
//! - **Configuration**: `dox.toml`/`.dox.toml` discovery and parsing
//! - **Sync engine**: bounded-concurrency conditional fetch across sources
//! - **Drivers**: the repository and direct-url source kinds
//! - **Parsers**: format-specific description/outline extraction
//! - **Manifest**: the generated JSON index over a synced cache
//! - **Search**: fuzzy metadata search and streamed content grep
//! - **Error handling**: a single discriminated error type with hints and context
//!
//! ## Quick start
//!
//! ```no_run
//! use dox_core::config::Config;
//! use dox_core::sync::{self, SyncFlags, NullEventSink};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> dox_core::error::Result<()> {
//! let config = Config::load()?;
//! let summary = sync::run(&config, &[], SyncFlags::default(), &NullEventSink, CancellationToken::new()).await?;
//! println!("synced {} sources", summary.sources);
//! # Ok(())
//! # }
//! ```

/// Atomic file write helpers shared by the lock store, manifest, and drivers.
pub mod atomic;
/// `dox.toml`/`.dox.toml` discovery and parsing.
pub mod config;
/// Format detection and preflight utilities (extension, binary sniff, front matter).
pub mod detect;
/// Source drivers: repository and direct-url sync.
pub mod drivers;
/// Error types and the crate-wide `Result` alias.
pub mod error;
/// Include/exclude glob matching.
pub mod globs;
/// The `.dox.lock` integrity/caching store.
pub mod lock;
/// The manifest generator: walks a synced cache into `manifest.json`.
pub mod manifest;
/// Format-specific parsers (Markdown, MDX, plain text, TS/TSX).
pub mod parser;
/// Fuzzy metadata search and streamed content grep.
pub mod search;
/// The sync engine: bounded-concurrency orchestration across sources.
pub mod sync;
/// Core data types shared by every module above.
pub mod types;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use manifest::generate as generate_manifest;
pub use sync::{NullEventSink, SyncEventSink, SyncFlags, SyncSummary};
pub use types::{Collection, FileRecord, Lock, LockEntry, Manifest, Outline, SourceDescriptor, SourceKind};

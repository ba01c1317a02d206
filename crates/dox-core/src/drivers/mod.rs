//! Source drivers: the conditional-fetch + atomic-materialization contract
//! shared by the two closed source kinds (repository, direct-url).

mod github;
mod http;
pub mod repository;
pub mod url;

pub use http::build_client;
pub use repository::RepositoryDriver;
pub use url::UrlDriver;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::LockEntry;

/// Per-call flags threaded through a driver's `sync`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Bypass conditional-fetch short-circuiting; always re-download.
    pub force: bool,
    /// Compute the diff and hit the network, but never touch the filesystem.
    pub dry_run: bool,
}

/// The result of one source's sync pass.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// Number of files written to disk.
    pub downloaded: usize,
    /// Number of files removed from disk.
    pub deleted: usize,
    /// `true` if the remote was unchanged and no work was done.
    pub skipped: bool,
    /// The lock entry reflecting the post-sync state.
    pub lock_entry: LockEntry,
}

/// Context shared across a single sync invocation: the resolved auth
/// token and a cancellation signal honored at every HTTP suspension point.
#[derive(Debug, Clone, Default)]
pub struct DriverContext {
    /// Bearer token for the repository driver, if configured.
    pub github_token: Option<String>,
    /// Cooperative cancellation, propagated into every HTTP call.
    pub cancellation: CancellationToken,
}

/// The shared capability both source kinds implement. A closed variant —
/// no open-ended trait-object registry, per spec.md §9's design note.
#[async_trait::async_trait]
pub trait SourceDriver: Send + Sync {
    /// Performs one sync pass for this source, per spec.md §4.4.
    async fn sync(
        &self,
        ctx: &DriverContext,
        dest_dir: &std::path::Path,
        prev_lock_entry: Option<&LockEntry>,
        options: SyncOptions,
    ) -> Result<SyncOutcome>;
}

//! The sync engine: parallel orchestration of per-source conditional
//! fetch, with bounded concurrency and failure containment, per spec.md
//! §4.5.
//!
//! Each source runs on its own task; a [`tokio::sync::Semaphore`] bounds
//! how many run concurrently (the spec's "worker pool over a semaphore,
//! not unbounded task spawning"). A [`tokio::sync::Mutex`]-guarded map is
//! the only extra synchronization needed to aggregate results once every
//! task has joined.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::drivers::{
    DriverContext, RepositoryDriver, SourceDriver, SyncOptions, SyncOutcome, UrlDriver,
    build_client,
};
use crate::error::{Error, Result};
use crate::manifest;
use crate::types::{LockEntry, SourceDescriptor, SourceKind};

/// Smart default for `max_parallel` when neither a flag nor a config
/// value is supplied: the work is I/O-bound, so oversubscribe the CPU
/// count.
#[must_use]
pub fn default_max_parallel() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(4)
        .saturating_mul(4)
        .max(10)
}

/// Flags controlling one invocation of [`run`].
#[derive(Debug, Clone, Default)]
pub struct SyncFlags {
    /// Bypass conditional-fetch short-circuiting for every selected source.
    pub force: bool,
    /// Compute diffs and hit the network, but never write to disk, the
    /// lock, or the manifest.
    pub dry_run: bool,
    /// Remove the output root recursively before syncing (ignored when
    /// `dry_run` is set).
    pub clean: bool,
    /// Explicit concurrency cap; `None` defers to config, then the smart
    /// default.
    pub max_parallel: Option<usize>,
}

/// Per-source outcome, as observed by the caller (CLI, tests, event sink).
#[derive(Debug, Clone)]
pub struct SourceResult {
    /// The source's configured name.
    pub name: String,
    /// `Ok` outcome, or the error that source's sync produced.
    pub outcome: std::result::Result<SyncOutcome, Error>,
}

/// Aggregate result of a full [`run`] invocation.
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    /// Number of sources processed.
    pub sources: usize,
    /// Sum of `downloaded` across all successful sources.
    pub downloaded: usize,
    /// Sum of `deleted` across all successful sources.
    pub deleted: usize,
    /// Number of sources that reported `skipped = true`.
    pub skipped: usize,
    /// Number of sources that failed.
    pub errors: usize,
    /// Per-source detail, in the order sources were selected.
    pub results: Vec<SourceResult>,
}

/// Observer hook for progress rendering (CLI progress bars, test
/// assertions). All methods have a no-op default so callers only
/// implement what they need.
pub trait SyncEventSink: Send + Sync {
    /// A source's worker has started.
    fn source_start(&self, _name: &str) {}
    /// A source's worker has finished, successfully or not.
    fn source_done(&self, _name: &str, _result: &std::result::Result<SyncOutcome, Error>) {}
    /// Manifest regeneration failed after an otherwise-successful sync.
    fn manifest_error(&self, _err: &Error) {}
}

/// A sink that does nothing; the default when the caller doesn't care.
pub struct NullEventSink;
impl SyncEventSink for NullEventSink {}

/// Runs a sync pass across the sources named in `requested` (empty ⇒
/// all, in lexicographic order), per spec.md §4.5.
///
/// # Errors
///
/// Returns [`crate::error::ErrorKind::SourceNotFound`] if `requested`
/// names a source absent from `config`. Returns other top-level errors
/// only for failures that abort the whole run (the `clean` step, lock
/// load/save); individual source failures are contained in the returned
/// [`SyncSummary`].
#[instrument(skip(config, sink, cancellation))]
pub async fn run(
    config: &Config,
    requested: &[String],
    flags: SyncFlags,
    sink: &dyn SyncEventSink,
    cancellation: CancellationToken,
) -> Result<SyncSummary> {
    let output_root = config.output_root();

    if flags.clean && !flags.dry_run {
        if output_root.exists() {
            std::fs::remove_dir_all(&output_root)?;
        }
        info!(path = %output_root.display(), "cleaned output root");
    }

    let mut lock = crate::lock::load(&output_root)?;

    let names = resolve_names(config, requested)?;

    let max_parallel = flags
        .max_parallel
        .or(config.max_parallel)
        .unwrap_or_else(default_max_parallel)
        .max(1);

    let github_token = resolve_github_token(config);
    let http_client = build_client()?;

    let semaphore = Arc::new(Semaphore::new(max_parallel));
    let results: Arc<Mutex<Vec<SourceResult>>> = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::with_capacity(names.len());
    for name in &names {
        let descriptor = config
            .source(name)
            .cloned()
            .ok_or_else(|| Error::source_not_found(name.clone()))?;
        let prev_entry = lock.sources.get(name).cloned();
        let excludes = config.global_excludes().to_vec();

        let semaphore = Arc::clone(&semaphore);
        let results = Arc::clone(&results);
        let http_client = http_client.clone();
        let github_token = github_token.clone();
        let output_root = output_root.clone();
        let cancellation = cancellation.clone();
        let flags = flags;
        let name = name.clone();

        sink_start(sink, &name);

        let handle = tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let dest_dir = output_root.join(descriptor.output_dir());
            let ctx = DriverContext {
                github_token,
                cancellation: cancellation.clone(),
            };
            let options = SyncOptions {
                force: flags.force,
                dry_run: flags.dry_run,
            };

            let outcome = tokio::select! {
                () = cancellation.cancelled() => Err(Error::other("sync cancelled")),
                res = sync_one(&descriptor, &http_client, &ctx, &dest_dir, prev_entry.as_ref(), options, &excludes) => res,
            };

            drop(permit);
            results
                .lock()
                .await
                .push(SourceResult { name, outcome });
        });
        handles.push(handle);
    }

    for handle in handles {
        if let Err(err) = handle.await {
            error!(%err, "sync worker task panicked");
        }
    }

    let mut results = Arc::try_unwrap(results)
        .map(Mutex::into_inner)
        .unwrap_or_default();
    // Preserve the lexicographic selection order regardless of task completion order.
    let order: BTreeMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.as_str(), i))
        .collect();
    results.sort_by_key(|r| order.get(r.name.as_str()).copied().unwrap_or(usize::MAX));

    for result in &results {
        sink_done(sink, &result.name, &result.outcome);
    }

    let mut summary = SyncSummary {
        sources: results.len(),
        ..Default::default()
    };

    for result in &results {
        match &result.outcome {
            Ok(outcome) => {
                summary.downloaded += outcome.downloaded;
                summary.deleted += outcome.deleted;
                if outcome.skipped {
                    summary.skipped += 1;
                }
                if !flags.dry_run {
                    crate::lock::set(&mut lock, result.name.clone(), outcome.lock_entry.clone());
                }
            },
            Err(_) => summary.errors += 1,
        }
    }
    summary.results = results;

    if !flags.dry_run {
        crate::lock::save(&output_root, &lock)?;

        if let Err(err) = manifest::generate(config, &lock) {
            warn!(%err, "manifest generation failed after sync");
            sink.manifest_error(&err);
        }
    }

    if summary.errors > 0 {
        return Err(Error::other(format!(
            "{} of {} sources failed to sync",
            summary.errors, summary.sources
        ))
        .with_hint("inspect individual source errors for detail")
        .with_context("errors", summary.errors)
        .with_context("sources", summary.sources)
        .with_source(SyncPartialFailure));
    }

    Ok(summary)
}

fn sink_start(sink: &dyn SyncEventSink, name: &str) {
    sink.source_start(name);
}

fn sink_done(sink: &dyn SyncEventSink, name: &str, result: &std::result::Result<SyncOutcome, Error>) {
    sink.source_done(name, result);
}

#[allow(clippy::too_many_arguments)]
async fn sync_one(
    descriptor: &SourceDescriptor,
    http_client: &Client,
    ctx: &DriverContext,
    dest_dir: &Path,
    prev_entry: Option<&LockEntry>,
    options: SyncOptions,
    excludes: &[String],
) -> Result<SyncOutcome> {
    let driver: Box<dyn SourceDriver> = match &descriptor.kind {
        SourceKind::Repository {
            host,
            repo,
            r#ref,
            path,
            include,
            exclude,
        } => {
            let include = if include.is_empty() {
                crate::types::DEFAULT_INCLUDES
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect()
            } else {
                include.clone()
            };
            let mut merged_exclude = exclude.clone();
            merged_exclude.extend(excludes.iter().cloned());
            merged_exclude.sort();
            merged_exclude.dedup();

            Box::new(RepositoryDriver::new(
                http_client.clone(),
                ctx.github_token.clone(),
                host.clone(),
                repo.clone(),
                r#ref.clone(),
                path.clone(),
                &include,
                &merged_exclude,
            )?)
        },
        SourceKind::DirectUrl { url, filename } => Box::new(UrlDriver::new(
            http_client.clone(),
            url.clone(),
            filename.clone(),
            descriptor.name.clone(),
        )),
    };

    driver.sync(ctx, dest_dir, prev_entry, options).await
}

fn resolve_names(config: &Config, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        let mut names: Vec<String> = config.sources.keys().cloned().collect();
        names.sort();
        return Ok(names);
    }

    let mut seen = std::collections::BTreeSet::new();
    let mut names = Vec::new();
    for name in requested {
        if !config.sources.contains_key(name) {
            return Err(Error::source_not_found(name.clone())
                .with_hint("run `dox list` to see configured sources")
                .with_context("name", name));
        }
        if seen.insert(name.clone()) {
            names.push(name.clone());
        }
    }
    Ok(names)
}

fn resolve_github_token(config: &Config) -> Option<String> {
    config
        .github_token
        .clone()
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .or_else(|| std::env::var("GH_TOKEN").ok())
}

#[derive(Debug)]
struct SyncPartialFailure;

impl std::fmt::Display for SyncPartialFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sync-partial-failure")
    }
}

impl std::error::Error for SyncPartialFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_max_parallel_is_at_least_ten() {
        assert!(default_max_parallel() >= 10);
    }

    #[test]
    fn resolve_names_empty_request_returns_all_sorted() {
        let config = Config::test_with_sources(&["zeta", "alpha", "mid"]);
        let names = resolve_names(&config, &[]).expect("resolve");
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn resolve_names_dedupes_preserving_order() {
        let config = Config::test_with_sources(&["a", "b"]);
        let names = resolve_names(&config, &["b".into(), "a".into(), "b".into()]).expect("resolve");
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn resolve_names_unknown_source_errors() {
        let config = Config::test_with_sources(&["a"]);
        let err = resolve_names(&config, &["missing".into()]).expect_err("should fail");
        assert_eq!(err.kind().code(), "source-not-found");
    }

    #[test]
    fn resolve_github_token_prefers_config_over_env() {
        let mut config = Config::test_with_sources(&[]);
        config.github_token = Some("from-config".into());
        assert_eq!(resolve_github_token(&config).as_deref(), Some("from-config"));
    }
}

//! Repository source driver: directory or single-file sync against a
//! code-hosting repository, per spec.md §4.4.1.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::github::GithubClient;
use super::{DriverContext, SourceDriver, SyncOptions, SyncOutcome};
use crate::error::{Error, Result};
use crate::globs::{GlobFilter, normalize_repo_path, relative_under_base};
use crate::types::LockEntry;

/// Extensions recognized as a single-file doc target (descriptor `path`
/// ends with one of these and does not end with `/`).
const SINGLE_FILE_EXTENSIONS: &[&str] = &["md", "mdx", "txt", "rst"];

/// Drives sync for a `SourceKind::Repository` descriptor.
pub struct RepositoryDriver {
    client: GithubClient,
    host: String,
    owner_repo: String,
    configured_ref: Option<String>,
    path: String,
    include: GlobFilter,
}

impl RepositoryDriver {
    /// Builds a driver for one repository source. `include`/`exclude`
    /// should already have the global config excludes unioned in.
    pub fn new(
        http_client: Client,
        github_token: Option<String>,
        host: impl Into<String>,
        owner_repo: impl Into<String>,
        configured_ref: Option<String>,
        path: impl Into<String>,
        include_globs: &[String],
        exclude_globs: &[String],
    ) -> Result<Self> {
        let include = GlobFilter::new(include_globs, exclude_globs)?;
        Ok(Self {
            client: GithubClient::new(http_client, github_token),
            host: host.into(),
            owner_repo: owner_repo.into(),
            configured_ref,
            path: normalize_repo_path(&path.into()),
            include,
        })
    }

    fn is_single_file_path(&self) -> bool {
        if self.path.ends_with('/') || self.path.is_empty() {
            return false;
        }
        let ext = Path::new(&self.path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        matches!(ext.as_deref(), Some(e) if SINGLE_FILE_EXTENSIONS.contains(&e))
    }

    async fn resolve_ref(&self, cancellation: &CancellationToken) -> Result<String> {
        if let Some(r) = &self.configured_ref {
            return Ok(r.clone());
        }
        self.client
            .default_branch(&self.host, &self.owner_repo, cancellation)
            .await
    }

    async fn sync_directory(
        &self,
        dest_dir: &Path,
        prev: Option<(&str, &BTreeMap<String, String>)>,
        options: SyncOptions,
        cancellation: &CancellationToken,
    ) -> Result<SyncOutcome> {
        let ref_resolved = self.resolve_ref(cancellation).await?;
        let tree = self
            .client
            .recursive_tree(&self.host, &self.owner_repo, &ref_resolved, cancellation)
            .await?;

        if tree.truncated {
            return Err(Error::tree_truncated(
                "repository tree listing was truncated by the API",
            )
            .with_hint("narrow the source's `path` to a smaller subtree")
            .with_context("path", &self.path));
        }

        let prev_tree_sha = prev.map(|(sha, _)| sha);
        if !options.force && prev_tree_sha == Some(tree.sha.as_str()) {
            let files = prev.map(|(_, files)| files.clone()).unwrap_or_default();
            return Ok(SyncOutcome {
                downloaded: 0,
                deleted: 0,
                skipped: true,
                lock_entry: LockEntry::Repository {
                    synced_at: Utc::now(),
                    tree_sha: tree.sha,
                    ref_resolved,
                    files,
                },
            });
        }

        let mut new_files: BTreeMap<String, String> = BTreeMap::new();
        for entry in &tree.tree {
            if !entry.is_blob() {
                continue;
            }
            let Some(rel) = relative_under_base(&entry.path, &self.path) else {
                continue;
            };
            if !self.include.is_match(rel) {
                continue;
            }
            let Some(sha) = &entry.sha else { continue };
            new_files.insert(rel.to_string(), sha.clone());
        }

        let prev_files = prev.map(|(_, files)| files).cloned().unwrap_or_default();

        let mut to_download: Vec<String> = new_files
            .iter()
            .filter(|(path, sha)| {
                options.force
                    || prev_files.get(*path).is_none_or(|prev_sha| prev_sha != *sha)
            })
            .map(|(path, _)| path.clone())
            .collect();
        to_download.sort();

        let mut to_delete: Vec<String> = prev_files
            .keys()
            .filter(|path| !new_files.contains_key(*path))
            .cloned()
            .collect();
        to_delete.sort();

        if !options.dry_run {
            for rel in &to_download {
                if cancellation.is_cancelled() {
                    return Err(super::http::cancelled_error());
                }
                let sha = new_files
                    .get(rel)
                    .expect("to_download paths come from new_files keys");
                let bytes = self
                    .client
                    .fetch_blob(&self.host, &self.owner_repo, sha, cancellation)
                    .await?;
                let target = dest_dir.join(rel);
                crate::atomic::write_atomic(&target, &bytes)?;
                debug!(path = rel, "downloaded file");
            }
            for rel in &to_delete {
                remove_file_and_empty_dirs(dest_dir, rel)?;
                debug!(path = rel, "deleted file");
            }
        }

        info!(
            downloaded = to_download.len(),
            deleted = to_delete.len(),
            "repository directory sync complete"
        );

        Ok(SyncOutcome {
            downloaded: to_download.len(),
            deleted: to_delete.len(),
            skipped: false,
            lock_entry: LockEntry::Repository {
                synced_at: Utc::now(),
                tree_sha: tree.sha,
                ref_resolved,
                files: new_files,
            },
        })
    }

    async fn sync_single_file(
        &self,
        dest_dir: &Path,
        prev: Option<(&str, &BTreeMap<String, String>)>,
        options: SyncOptions,
        cancellation: &CancellationToken,
    ) -> Result<SyncOutcome> {
        let ref_resolved = self.resolve_ref(cancellation).await?;
        let basename = Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
            .to_string();

        let sha = self
            .client
            .content_sha(&self.host, &self.owner_repo, &self.path, &ref_resolved, cancellation)
            .await?;

        let prev_sha = prev.and_then(|(_, files)| files.get(&basename));
        if !options.force && prev_sha == Some(&sha) {
            let files = prev.map(|(_, files)| files.clone()).unwrap_or_default();
            return Ok(SyncOutcome {
                downloaded: 0,
                deleted: 0,
                skipped: true,
                lock_entry: LockEntry::Repository {
                    synced_at: Utc::now(),
                    tree_sha: prev.map(|(sha, _)| sha.to_string()).unwrap_or_default(),
                    ref_resolved,
                    files,
                },
            });
        }

        if !options.dry_run {
            let bytes = self
                .client
                .fetch_blob(&self.host, &self.owner_repo, &sha, cancellation)
                .await?;
            let target = dest_dir.join(&basename);
            crate::atomic::write_atomic(&target, &bytes)?;
        }

        let mut files = BTreeMap::new();
        files.insert(basename, sha);

        Ok(SyncOutcome {
            downloaded: 1,
            deleted: 0,
            skipped: false,
            lock_entry: LockEntry::Repository {
                synced_at: Utc::now(),
                tree_sha: prev.map(|(sha, _)| sha.to_string()).unwrap_or_default(),
                ref_resolved,
                files,
            },
        })
    }
}

#[async_trait::async_trait]
impl SourceDriver for RepositoryDriver {
    async fn sync(
        &self,
        ctx: &DriverContext,
        dest_dir: &Path,
        prev_lock_entry: Option<&LockEntry>,
        options: SyncOptions,
    ) -> Result<SyncOutcome> {
        let prev = match prev_lock_entry {
            Some(LockEntry::Repository {
                tree_sha, files, ..
            }) => Some((tree_sha.as_str(), files)),
            _ => None,
        };

        if self.is_single_file_path() {
            self.sync_single_file(dest_dir, prev, options, &ctx.cancellation).await
        } else {
            self.sync_directory(dest_dir, prev, options, &ctx.cancellation).await
        }
    }
}

/// Removes `dest_dir/rel`, then walks upward removing directories that
/// became empty, stopping before `dest_dir` itself.
fn remove_file_and_empty_dirs(dest_dir: &Path, rel: &str) -> Result<()> {
    let target = dest_dir.join(rel);
    if target.exists() {
        std::fs::remove_file(&target)?;
    }

    let mut dir: PathBuf = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dest_dir.to_path_buf());

    while dir != dest_dir && dir.starts_with(dest_dir) {
        match std::fs::read_dir(&dir) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    break;
                }
            },
            Err(_) => break,
        }
        if std::fs::remove_dir(&dir).is_err() {
            break;
        }
        let Some(parent) = dir.parent() else { break };
        dir = parent.to_path_buf();
    }

    Ok(())
}

//! Direct-URL source driver: single-file conditional GET, per spec.md
//! §4.4.2.

use std::path::Path;

use chrono::Utc;
use reqwest::Client;
use tracing::debug;

use super::{DriverContext, SourceDriver, SyncOptions, SyncOutcome};
use crate::error::{Error, Result};
use crate::types::LockEntry;

/// Drives sync for a `SourceKind::DirectUrl` descriptor.
pub struct UrlDriver {
    client: Client,
    url: String,
    filename: Option<String>,
    source_name: String,
}

impl UrlDriver {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        filename: Option<String>,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            filename,
            source_name: source_name.into(),
        }
    }

    fn resolve_filename(&self) -> String {
        if let Some(name) = &self.filename {
            return name.clone();
        }
        let from_url = reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .and_then(std::iter::Iterator::last)
                    .filter(|seg| !seg.is_empty() && *seg != ".")
                    .map(str::to_string)
            });
        from_url.unwrap_or_else(|| format!("{}.txt", self.source_name))
    }
}

#[async_trait::async_trait]
impl SourceDriver for UrlDriver {
    async fn sync(
        &self,
        ctx: &DriverContext,
        dest_dir: &Path,
        prev_lock_entry: Option<&LockEntry>,
        options: SyncOptions,
    ) -> Result<SyncOutcome> {
        let prev = match prev_lock_entry {
            Some(LockEntry::DirectUrl {
                etag,
                last_modified,
                ..
            }) => Some((etag.clone(), last_modified.clone())),
            _ => None,
        };

        let filename = self.resolve_filename();

        let mut request = self.client.get(&self.url);
        if !options.force {
            if let Some((Some(etag), _)) = &prev {
                request = request.header("If-None-Match", etag.clone());
            }
            if let Some((_, Some(last_modified))) = &prev {
                request = request.header("If-Modified-Since", last_modified.clone());
            }
        }

        let response = tokio::select! {
            () = ctx.cancellation.cancelled() => return Err(super::http::cancelled_error()),
            res = request.send() => res.map_err(Error::from)?,
        };
        let status = response.status();

        if status == reqwest::StatusCode::NOT_MODIFIED {
            let (etag, last_modified) = prev.unwrap_or((None, None));
            debug!(url = %self.url, "not modified");
            return Ok(SyncOutcome {
                downloaded: 0,
                deleted: 0,
                skipped: true,
                lock_entry: LockEntry::DirectUrl {
                    synced_at: Utc::now(),
                    etag,
                    last_modified,
                },
            });
        }

        if !status.is_success() {
            return Err(Error::download_failed(format!(
                "GET {} failed: {status}",
                self.url
            ))
            .with_context("url", &self.url)
            .with_context("status", status.as_u16()));
        }

        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = tokio::select! {
            () = ctx.cancellation.cancelled() => return Err(super::http::cancelled_error()),
            res = response.bytes() => res.map_err(Error::from)?,
        };

        if !options.dry_run {
            let target = dest_dir.join(&filename);
            crate::atomic::write_atomic(&target, &bytes)?;
        }

        Ok(SyncOutcome {
            downloaded: 1,
            deleted: 0,
            skipped: false,
            lock_entry: LockEntry::DirectUrl {
                synced_at: Utc::now(),
                etag,
                last_modified,
            },
        })
    }
}

//! Minimal GitHub REST API client: repo metadata, recursive tree listing,
//! per-path content metadata, and base64 blob fetch. The one code-host
//! dialect the repository driver speaks (spec.md §4.4.1).

use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::http::{MAX_ATTEMPTS, rate_limit_error, with_retry};
use crate::error::{Error, Result};

/// Header name GitHub uses to report remaining rate-limit quota.
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
/// Below this remaining-request count, emit a one-shot warning.
const LOW_RATE_LIMIT_THRESHOLD: u64 = 10;

fn api_base(host: &str) -> String {
    if host == "github.com" {
        "https://api.github.com".to_string()
    } else {
        format!("https://{host}/api/v3")
    }
}

/// A single GitHub API request/response round trip, shared by every call
/// below: sets auth + `User-Agent`, retries transient failures, and
/// inspects rate-limit headers per spec.md §4.4.1. The `warned` latch
/// ensures the low-rate-limit warning fires at most once per driver
/// instance.
pub struct GithubClient {
    client: Client,
    token: Option<String>,
    warned_low_rate_limit: AtomicBool,
}

impl GithubClient {
    pub fn new(client: Client, token: Option<String>) -> Self {
        Self {
            client,
            token,
            warned_low_rate_limit: AtomicBool::new(false),
        }
    }

    async fn get(&self, url: &str, cancellation: &CancellationToken) -> Result<reqwest::Response> {
        with_retry(cancellation, || async {
            let mut request = self.client.get(url);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            let response = request.send().await?;
            self.check_rate_limit(&response)?;
            if !response.status().is_success() {
                return Err(Error::github_api_error(format!(
                    "GitHub API request failed: {}",
                    response.status()
                ))
                .with_context("url", url)
                .with_context("status", response.status().as_u16()));
            }
            Ok(response)
        })
        .await
    }

    fn check_rate_limit(&self, response: &reqwest::Response) -> Result<()> {
        let Some(remaining) = response
            .headers()
            .get(RATE_LIMIT_REMAINING)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
        else {
            return Ok(());
        };

        if remaining == 0 {
            let reset_at = response
                .headers()
                .get(RATE_LIMIT_RESET)
                .and_then(|v| v.to_str().ok());
            return Err(rate_limit_error(reset_at));
        }

        if remaining <= LOW_RATE_LIMIT_THRESHOLD
            && self
                .warned_low_rate_limit
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            warn!(remaining, "GitHub API rate limit running low");
        }

        Ok(())
    }

    /// Fetches the repository's default branch name.
    pub async fn default_branch(
        &self,
        host: &str,
        owner_repo: &str,
        cancellation: &CancellationToken,
    ) -> Result<String> {
        let url = format!("{}/repos/{owner_repo}", api_base(host));
        let response = self.get(&url, cancellation).await?;
        let repo: RepoMeta = response.json().await.map_err(Error::from)?;
        Ok(repo.default_branch)
    }

    /// Fetches the full recursive tree for `git_ref`.
    pub async fn recursive_tree(
        &self,
        host: &str,
        owner_repo: &str,
        git_ref: &str,
        cancellation: &CancellationToken,
    ) -> Result<TreeResponse> {
        let url = format!(
            "{}/repos/{owner_repo}/git/trees/{git_ref}?recursive=1",
            api_base(host)
        );
        let response = self.get(&url, cancellation).await?;
        response.json().await.map_err(Error::from)
    }

    /// Fetches content metadata (to get the blob `sha`) for a single path.
    pub async fn content_sha(
        &self,
        host: &str,
        owner_repo: &str,
        path: &str,
        git_ref: &str,
        cancellation: &CancellationToken,
    ) -> Result<String> {
        let url = format!(
            "{}/repos/{owner_repo}/contents/{path}?ref={git_ref}",
            api_base(host)
        );
        let response = self.get(&url, cancellation).await?;
        let meta: ContentMeta = response.json().await.map_err(Error::from)?;
        Ok(meta.sha)
    }

    /// Fetches and base64-decodes a blob by its sha.
    pub async fn fetch_blob(
        &self,
        host: &str,
        owner_repo: &str,
        sha: &str,
        cancellation: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let url = format!("{}/repos/{owner_repo}/git/blobs/{sha}", api_base(host));
        let response = self.get(&url, cancellation).await?;
        let blob: BlobResponse = response.json().await.map_err(Error::from)?;
        decode_blob(&blob.content)
    }
}

/// Decodes a GitHub blob's base64 content, tolerating embedded newlines.
fn decode_blob(content: &str) -> Result<Vec<u8>> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(cleaned)
        .map_err(|e| Error::download_failed(format!("invalid base64 blob content: {e}")))
}

#[derive(Debug, Deserialize)]
struct RepoMeta {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
    pub sha: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub sha: Option<String>,
}

impl TreeEntry {
    #[must_use]
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

#[derive(Debug, Deserialize)]
struct ContentMeta {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
}

/// Exposed for tests that need to assert on retry-exhaustion behavior
/// without reaching into the private constant.
#[cfg(test)]
pub(crate) const TEST_MAX_ATTEMPTS: u32 = MAX_ATTEMPTS;

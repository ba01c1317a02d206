//! Shared HTTP client construction and the retry/backoff loop used by the
//! repository driver's GitHub API calls.

use std::time::Duration;

use reqwest::Client;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Builds the one `reqwest::Client` reused by a driver across all its
/// requests: gzip/brotli, a product User-Agent, and a generous but finite
/// timeout (the engine's own cancellation token governs abandonment).
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("dox/", env!("CARGO_PKG_VERSION")))
        .gzip(true)
        .brotli(true)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(Error::from)
}

/// Maximum retry attempts for a transient HTTP failure.
pub const MAX_ATTEMPTS: u32 = 3;
/// Upper bound on the exponential backoff delay between attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Runs `op` up to [`MAX_ATTEMPTS`] times, backing off exponentially
/// (capped at [`MAX_BACKOFF`]) between attempts when the error is
/// recoverable (per [`Error::is_recoverable`]). Non-recoverable errors
/// return immediately without retrying.
///
/// Each attempt races against `cancellation`: a cancelled token aborts an
/// in-flight call immediately rather than waiting for it to resolve, per
/// the engine's cooperative-cancellation contract.
pub async fn with_retry<T, F, Fut>(cancellation: &CancellationToken, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let outcome = tokio::select! {
            () = cancellation.cancelled() => return Err(cancelled_error()),
            res = op() => res,
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS && err.is_recoverable() => {
                let delay = backoff_delay(attempt);
                debug!(attempt, ?delay, error = %err, "retrying after transient failure");
                tokio::select! {
                    () = cancellation.cancelled() => return Err(cancelled_error()),
                    () = sleep(delay) => {},
                }
            },
            Err(err) => return Err(err),
        }
    }
}

/// The error returned when a cancellation token fires mid-request.
pub fn cancelled_error() -> Error {
    Error::other("sync cancelled")
}

fn backoff_delay(attempt: u32) -> Duration {
    let millis = 250u64.saturating_mul(1u64 << attempt.min(6));
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

/// Builds a `github-rate-limit` error from the reset timestamp header
/// value, per spec.md §4.4.1.
pub fn rate_limit_error(reset_at: Option<&str>) -> Error {
    let mut err = Error::new(
        ErrorKind::GithubRateLimit,
        "GitHub API rate limit exhausted",
    )
    .with_hint("Set `GITHUB_TOKEN` to increase rate limit");
    if let Some(reset_at) = reset_at {
        err = err.with_context("reset_at", reset_at);
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_recoverable_errors_up_to_max_attempts() {
        let calls = AtomicU32::new(0);
        let token = CancellationToken::new();
        let result: Result<()> = with_retry(&token, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::new(ErrorKind::Network, "boom"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn succeeds_without_retry_on_first_success() {
        let calls = AtomicU32::new(0);
        let token = CancellationToken::new();
        let result = with_retry(&token, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Error>(42)
        })
        .await
        .expect("ok");
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_non_recoverable_errors() {
        let calls = AtomicU32::new(0);
        let token = CancellationToken::new();
        let result: Result<()> = with_retry(&token, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::config_invalid("bad"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_token_aborts_before_first_attempt() {
        let calls = AtomicU32::new(0);
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<()> = with_retry(&token, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn backoff_delay_is_capped() {
        for attempt in 1..20 {
            assert!(backoff_delay(attempt) <= MAX_BACKOFF);
        }
    }

    #[test]
    fn rate_limit_error_carries_hint_and_reset_context() {
        let err = rate_limit_error(Some("1700000000"));
        assert_eq!(err.kind().code(), "github-rate-limit");
        assert!(err.hint().is_some());
        assert_eq!(err.context().get("reset_at").map(String::as_str), Some("1700000000"));
    }
}

//! Error types for dox-core.
//!
//! All public functions return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Errors carry a [`ErrorKind`] discriminant,
//! a human-readable message, an optional recovery hint, and a small context
//! map of key-value pairs (source name, path, URL, status code, ...) so
//! callers can render actionable diagnostics without re-deriving them.
//!
//! ## Recovery
//!
//! [`Error::is_recoverable`] flags errors that are plausibly transient
//! (network timeouts, connection resets) so callers implementing retry
//! loops can distinguish them from permanent failures (bad config, missing
//! files).

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Discriminated error kinds, matching the taxonomy every `dox` surface
/// (sync, manifest, search, CLI) reports against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-supplied arguments failed validation (empty query, bad flag combination).
    InvalidArgs,
    /// No `dox.toml`/`.dox.toml` found while walking up from the working directory.
    ConfigNotFound,
    /// Config file exists but failed to parse or violates a documented constraint.
    ConfigInvalid,
    /// A `sources.<name>` block specified an unrecognized `type`.
    UnknownSourceType,
    /// A requested source name does not exist in the config.
    SourceNotFound,
    /// `.dox.lock` exists but is not valid JSON / fails schema expectations.
    LockCorrupt,
    /// `.dox.lock` could not be written (disk full, permissions).
    LockWriteError,
    /// `manifest.json` does not exist where a reader expected it.
    ManifestNotFound,
    /// `manifest.json` exists but failed to parse.
    ManifestCorrupt,
    /// `manifest.json` could not be written.
    ManifestWriteError,
    /// The code-hosting API returned an error response.
    GithubApiError,
    /// The code-hosting API reported the rate limit is exhausted.
    GithubRateLimit,
    /// A repository tree listing came back truncated.
    TreeTruncated,
    /// A blob or URL download failed outright.
    DownloadFailed,
    /// Writing a fetched file to disk failed.
    WriteFailed,
    /// A `--regex` search query failed to compile.
    InvalidRegex,
    /// A `--collection` filter named a collection absent from the manifest.
    CollectionNotFound,
    /// A requested file is absent from the manifest / disk.
    FileNotFound,
    /// A file exists but could not be read (permissions, I/O failure).
    FileReadError,
    /// Reserved for functionality described but intentionally unimplemented.
    NotImplemented,
    /// Catch-all for I/O failures not covered by a more specific kind.
    Io,
    /// Catch-all for network/HTTP failures not covered by a more specific kind.
    Network,
    /// Content could not be parsed by its format's parser.
    Parse,
    /// Uncategorized failure.
    Other,
}

impl ErrorKind {
    /// Returns a short, stable string identifier for logging and metrics.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidArgs => "invalid-args",
            Self::ConfigNotFound => "config-not-found",
            Self::ConfigInvalid => "config-invalid",
            Self::UnknownSourceType => "unknown-source-type",
            Self::SourceNotFound => "source-not-found",
            Self::LockCorrupt => "lock-corrupt",
            Self::LockWriteError => "lock-write-error",
            Self::ManifestNotFound => "manifest-not-found",
            Self::ManifestCorrupt => "manifest-corrupt",
            Self::ManifestWriteError => "manifest-write-error",
            Self::GithubApiError => "github-api-error",
            Self::GithubRateLimit => "github-rate-limit",
            Self::TreeTruncated => "tree-truncated",
            Self::DownloadFailed => "download-failed",
            Self::WriteFailed => "write-failed",
            Self::InvalidRegex => "invalid-regex",
            Self::CollectionNotFound => "collection-not-found",
            Self::FileNotFound => "file-not-found",
            Self::FileReadError => "file-read-error",
            Self::NotImplemented => "not-implemented",
            Self::Io => "io",
            Self::Network => "network",
            Self::Parse => "parse",
            Self::Other => "other",
        }
    }
}

/// The main error type for dox-core operations.
#[derive(Error, Debug)]
#[error("{kind_code}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    hint: Option<String>,
    context: BTreeMap<String, String>,
    kind_code: &'static str,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Builds a new error of the given kind with a message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            hint: None,
            context: BTreeMap::new(),
            kind_code: kind.code(),
            source: None,
        }
    }

    /// Attaches a recovery hint (e.g. "Set `GITHUB_TOKEN` to increase rate limit").
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attaches a context key-value pair (source name, path, URL, status, ...).
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Attaches an underlying error as the source of this one.
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The discriminated kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The recovery hint, if any was attached.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// The context key-value pairs attached to this error.
    #[must_use]
    pub const fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// Category string identifier, stable for logging/metrics grouping.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        self.kind.code()
    }

    /// Returns `true` for errors that are plausibly transient and worth retrying.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Network | ErrorKind::DownloadFailed | ErrorKind::GithubRateLimit
        )
    }
}

macro_rules! ctor {
    ($name:ident, $kind:expr) => {
        impl Error {
            #[doc = concat!("Constructs an `Error` of kind `", stringify!($kind), "`.")]
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new($kind, message)
            }
        }
    };
}

ctor!(invalid_args, ErrorKind::InvalidArgs);
ctor!(config_not_found, ErrorKind::ConfigNotFound);
ctor!(config_invalid, ErrorKind::ConfigInvalid);
ctor!(unknown_source_type, ErrorKind::UnknownSourceType);
ctor!(source_not_found, ErrorKind::SourceNotFound);
ctor!(lock_corrupt, ErrorKind::LockCorrupt);
ctor!(lock_write_error, ErrorKind::LockWriteError);
ctor!(manifest_not_found, ErrorKind::ManifestNotFound);
ctor!(manifest_corrupt, ErrorKind::ManifestCorrupt);
ctor!(manifest_write_error, ErrorKind::ManifestWriteError);
ctor!(github_api_error, ErrorKind::GithubApiError);
ctor!(github_rate_limit, ErrorKind::GithubRateLimit);
ctor!(tree_truncated, ErrorKind::TreeTruncated);
ctor!(download_failed, ErrorKind::DownloadFailed);
ctor!(write_failed, ErrorKind::WriteFailed);
ctor!(invalid_regex, ErrorKind::InvalidRegex);
ctor!(collection_not_found, ErrorKind::CollectionNotFound);
ctor!(file_not_found, ErrorKind::FileNotFound);
ctor!(file_read_error, ErrorKind::FileReadError);
ctor!(parse, ErrorKind::Parse);
ctor!(other, ErrorKind::Other);

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err.to_string()).with_source(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::new(ErrorKind::Network, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::ManifestCorrupt, err.to_string()).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::ConfigInvalid, err.to_string()).with_source(err)
    }
}

/// Convenience alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

//! Core data structures shared by sync, manifest, and search.
//!
//! ## Type categories
//!
//! - **Configuration input**: [`SourceDescriptor`], [`SourceKind`]
//! - **Lock state**: [`LockEntry`]
//! - **Manifest**: [`Manifest`], [`Collection`], [`FileRecord`], [`Outline`]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version written into every manifest.
pub const MANIFEST_VERSION: &str = "1.0.0";

/// Default include globs applied to `repository` sources when none are configured.
pub const DEFAULT_INCLUDES: &[&str] = &["**/*.md", "**/*.mdx", "**/*.txt"];

/// An immutable, user-configured description of a remote documentation source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Stable identifier used as the output subdirectory name (unless overridden).
    pub name: String,
    /// Optional custom output subdirectory; defaults to `name`.
    #[serde(default)]
    pub output_subdir: Option<String>,
    /// The kind-specific configuration.
    #[serde(flatten)]
    pub kind: SourceKind,
}

impl SourceDescriptor {
    /// The output subdirectory this source materializes into.
    #[must_use]
    pub fn output_dir(&self) -> &str {
        self.output_subdir.as_deref().unwrap_or(&self.name)
    }
}

/// Closed variant over the two supported remote source kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceKind {
    /// A directory or single file rooted in a code-hosting repository.
    Repository {
        /// Host identifier (e.g. `github.com`).
        host: String,
        /// `owner/repo` slug.
        repo: String,
        /// Branch, tag, or commit; `None` resolves to the remote default branch.
        #[serde(default)]
        r#ref: Option<String>,
        /// Path rooted in the repository (directory or single file).
        path: String,
        /// Include globs; defaults to [`DEFAULT_INCLUDES`] when empty.
        #[serde(default)]
        include: Vec<String>,
        /// Exclude globs, unioned with the global config excludes.
        #[serde(default)]
        exclude: Vec<String>,
    },
    /// A single file fetched directly via HTTP(S).
    DirectUrl {
        /// Absolute URL to fetch.
        url: String,
        /// Optional explicit output filename.
        #[serde(default)]
        filename: Option<String>,
    },
}

impl SourceKind {
    /// `"repository"` or `"direct-url"`, matching the lock/manifest `kind` field.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Repository { .. } => "repository",
            Self::DirectUrl { .. } => "direct-url",
        }
    }
}

/// Per-source persisted integrity/caching state.
///
/// Absence of an entry for a given source name is equivalent to that
/// source never having been synced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LockEntry {
    /// State for a `repository`-kind source.
    Repository {
        /// UTC timestamp of the most recently completed sync.
        synced_at: DateTime<Utc>,
        /// The resolved tree SHA at last sync.
        tree_sha: String,
        /// The ref that `tree_sha` was resolved against (branch/tag/commit).
        ref_resolved: String,
        /// `{ relative_path → blob_sha }` for every file downloaded.
        files: BTreeMap<String, String>,
    },
    /// State for a `direct-url`-kind source.
    DirectUrl {
        /// UTC timestamp of the most recently completed sync.
        synced_at: DateTime<Utc>,
        /// Last seen `ETag` response header, if any.
        #[serde(default)]
        etag: Option<String>,
        /// Last seen `Last-Modified` response header, if any.
        #[serde(default)]
        last_modified: Option<String>,
    },
}

impl LockEntry {
    /// UTC timestamp of the most recently completed sync, regardless of kind.
    #[must_use]
    pub const fn synced_at(&self) -> DateTime<Utc> {
        match self {
            Self::Repository { synced_at, .. } | Self::DirectUrl { synced_at, .. } => *synced_at,
        }
    }
}

/// Persisted lock file: `{output}/.dox.lock`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lock {
    /// Schema version; currently always `1`.
    pub version: u32,
    /// `{ source_name → lock entry }`.
    #[serde(default)]
    pub sources: BTreeMap<String, LockEntry>,
}

impl Lock {
    /// An empty lock, as returned when `.dox.lock` does not exist.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: 1,
            sources: BTreeMap::new(),
        }
    }
}

impl Default for Lock {
    fn default() -> Self {
        Self::empty()
    }
}

/// Global manifest: `{output}/manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Schema version string, currently [`MANIFEST_VERSION`].
    pub version: String,
    /// UTC timestamp this manifest was generated at.
    pub generated_at: DateTime<Utc>,
    /// `{ source_name → collection }`.
    #[serde(default)]
    pub collections: BTreeMap<String, Collection>,
}

/// One configured source's synchronized file set and identifying metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    /// The source's stable name.
    pub name: String,
    /// Output subdirectory, relative to the output root.
    pub output_subdir: String,
    /// `"repository"` or `"direct-url"`.
    pub kind: String,
    /// A human-readable origin string (e.g. `github.com/owner/repo`, or the URL).
    pub origin: String,
    /// The repository path or URL this collection was sourced from.
    pub path: String,
    /// Resolved ref, for repository sources; empty string otherwise.
    #[serde(default)]
    pub r#ref: String,
    /// Last successful sync time, copied from the lock entry (or generation time
    /// if no lock entry exists).
    pub last_sync: DateTime<Utc>,
    /// Number of file records in [`Collection::files`].
    pub file_count: usize,
    /// Sum of [`FileRecord::size`] across [`Collection::files`].
    pub total_size: u64,
    /// Count of files skipped during manifest generation due to parse failure
    /// (binary content detected after the size/NUL preflight).
    pub skipped: usize,
    /// File records, in filesystem walk order.
    pub files: Vec<FileRecord>,
}

/// One parsed/classified file within a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    /// Path relative to the collection's output subdirectory, forward-slash separated.
    pub path: String,
    /// Detected type tag (`md|mdx|txt|tsx|ts|unknown`).
    pub r#type: String,
    /// File size in bytes.
    pub size: u64,
    /// Line count.
    pub lines: usize,
    /// Filesystem modification time.
    pub modified: DateTime<Utc>,
    /// A human-facing description string derived by the matching parser.
    #[serde(default)]
    pub description: String,
    /// `documentation` or `code`; only set for TS/TSX files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// E.g. `file_too_large`, when a record was emitted without full parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Parsed structural outline, when applicable.
    #[serde(default, skip_serializing_if = "Outline::is_none")]
    pub outline: Outline,
}

/// A heading entry within a [`Outline::Headings`] outline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeadingItem {
    /// Heading level, `1..=6`.
    pub level: u8,
    /// Leaf-text content, whitespace-collapsed.
    pub text: String,
    /// 1-based line number in the original file.
    pub line: usize,
}

/// An export kind recognized by the TS/TSX parser.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// `export const NAME`
    Const,
    /// `export function NAME`
    Function,
    /// `export interface NAME`
    Interface,
    /// `export type NAME`
    Type,
    /// `export class NAME`
    Class,
}

impl ExportKind {
    /// The keyword as it appears after `export` in source.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Const => "const",
            Self::Function => "function",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Class => "class",
        }
    }

    pub(crate) fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "const" => Some(Self::Const),
            "function" => Some(Self::Function),
            "interface" => Some(Self::Interface),
            "type" => Some(Self::Type),
            "class" => Some(Self::Class),
            _ => None,
        }
    }
}

/// An export entry within a [`Outline::Exports`] outline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportItem {
    /// Which export keyword introduced this item.
    pub r#type: ExportKind,
    /// Exported identifier name.
    pub name: String,
    /// 1-based line number.
    pub line: usize,
}

/// A parsed structural summary of a file: headings, exports, or nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outline {
    /// No structural outline (plain text, or a TS file with no recognized exports).
    #[default]
    None,
    /// A sequence of Markdown/MDX/JSX headings, in document order.
    Headings {
        /// The heading items.
        items: Vec<HeadingItem>,
    },
    /// A sequence of top-level TypeScript exports, in document order.
    Exports {
        /// The export items.
        items: Vec<ExportItem>,
    },
}

impl Outline {
    fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_descriptor_output_dir_defaults_to_name() {
        let d = SourceDescriptor {
            name: "react".into(),
            output_subdir: None,
            kind: SourceKind::DirectUrl {
                url: "https://example.test/doc.txt".into(),
                filename: None,
            },
        };
        assert_eq!(d.output_dir(), "react");
    }

    #[test]
    fn source_kind_serializes_with_tag() {
        let kind = SourceKind::Repository {
            host: "github.com".into(),
            repo: "a/b".into(),
            r#ref: None,
            path: "docs".into(),
            include: vec![],
            exclude: vec![],
        };
        let json = serde_json::to_string(&kind).expect("serialize");
        assert!(json.contains("\"type\":\"repository\""));
    }

    #[test]
    fn outline_default_is_skipped_on_serialize() {
        #[derive(Serialize)]
        struct Wrap {
            #[serde(skip_serializing_if = "Outline::is_none")]
            outline: Outline,
        }
        let w = Wrap {
            outline: Outline::default(),
        };
        let json = serde_json::to_string(&w).expect("serialize");
        assert_eq!(json, "{}");
    }

    #[test]
    fn export_kind_keyword_round_trips() {
        for kw in ["const", "function", "interface", "type", "class"] {
            let kind = ExportKind::from_keyword(kw).expect("known keyword");
            assert_eq!(kind.keyword(), kw);
        }
        assert!(ExportKind::from_keyword("enum").is_none());
    }

    #[test]
    fn empty_lock_has_version_one() {
        let lock = Lock::empty();
        assert_eq!(lock.version, 1);
        assert!(lock.sources.is_empty());
    }
}

//! Streamed content search over a synced cache, per spec.md §4.7.2.
//!
//! Deliberately index-free: every invocation reads matching files fresh
//! off disk. No `tantivy`-style persisted index is built or maintained.

use std::path::Path;

use regex::RegexBuilder;

use super::validate_collection;
use crate::detect::is_binary;
use crate::error::{Error, Result};
use crate::manifest::MAX_FILE_SIZE;
use crate::types::Manifest;

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMatch {
    /// The collection (source) name.
    pub collection: String,
    /// File path relative to the collection's output subdirectory.
    pub path: String,
    /// 1-based line number within the file.
    pub line: usize,
    /// The full text of the matching line.
    pub text: String,
}

enum Matcher {
    Substring(String),
    Regex(regex::Regex),
}

impl Matcher {
    fn is_match(&self, line: &str) -> bool {
        match self {
            Self::Substring(needle) => line.to_lowercase().contains(needle),
            Self::Regex(re) => re.is_match(line),
        }
    }
}

/// Scans every file in `manifest` (optionally restricted to one
/// `collection`) under `output_root`, line by line, for `query`. Missing,
/// oversized (> 50 MiB), or binary files are skipped quietly. Stops once
/// `cap` matches have been emitted (`0` = unlimited).
///
/// # Errors
///
/// Returns [`crate::error::ErrorKind::InvalidArgs`] if `query` is empty,
/// [`crate::error::ErrorKind::CollectionNotFound`] if `collection` names
/// an absent collection, or [`crate::error::ErrorKind::InvalidRegex`] if
/// `use_regex` is set and `query` fails to compile.
pub fn content_search(
    manifest: &Manifest,
    output_root: &Path,
    query: &str,
    collection: Option<&str>,
    use_regex: bool,
    cap: usize,
) -> Result<Vec<ContentMatch>> {
    if query.is_empty() {
        return Err(Error::invalid_args("search query must not be empty"));
    }
    validate_collection(manifest, collection)?;

    let matcher = if use_regex {
        let re = RegexBuilder::new(query)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                Error::invalid_regex(format!("invalid regex `{query}`: {e}"))
                    .with_context("pattern", query)
            })?;
        Matcher::Regex(re)
    } else {
        Matcher::Substring(query.to_lowercase())
    };

    let mut results = Vec::new();

    'outer: for (name, coll) in &manifest.collections {
        if collection.is_some_and(|c| c != name) {
            continue;
        }
        for file in &coll.files {
            let target = output_root.join(&coll.output_subdir).join(&file.path);
            let Ok(metadata) = std::fs::metadata(&target) else {
                continue;
            };
            if metadata.len() > MAX_FILE_SIZE {
                continue;
            }
            let Ok(bytes) = std::fs::read(&target) else {
                continue;
            };
            if is_binary(&bytes) {
                continue;
            }
            let text = String::from_utf8_lossy(&bytes);
            for (idx, line) in text.lines().enumerate() {
                if matcher.is_match(line) {
                    results.push(ContentMatch {
                        collection: name.clone(),
                        path: file.path.clone(),
                        line: idx + 1,
                        text: line.to_string(),
                    });
                    if cap > 0 && results.len() >= cap {
                        break 'outer;
                    }
                }
            }
        }
    }

    Ok(results)
}

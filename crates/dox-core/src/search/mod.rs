//! Search over a synced cache: fuzzy metadata search and streamed content
//! grep, per spec.md §4.7. Both operate on an already-loaded [`Manifest`]
//! and neither persists an index — metadata search scores in memory on
//! every call, content search streams files from disk.

mod grep;
mod metadata;

pub use grep::{ContentMatch, content_search};
pub use metadata::{MetadataMatch, metadata_search};

use crate::error::{Error, Result};
use crate::types::Manifest;

/// Validates an optional `--collection` filter against a loaded manifest.
///
/// # Errors
///
/// Returns [`crate::error::ErrorKind::CollectionNotFound`] if `filter` is
/// `Some` and names a collection absent from `manifest`.
fn validate_collection(manifest: &Manifest, filter: Option<&str>) -> Result<()> {
    if let Some(name) = filter {
        if !manifest.collections.contains_key(name) {
            return Err(Error::collection_not_found(format!(
                "no collection named `{name}`"
            ))
            .with_context("collection", name));
        }
    }
    Ok(())
}

/// `0` means unlimited; any other value caps the result count.
fn apply_cap<T>(mut items: Vec<T>, cap: usize) -> Vec<T> {
    if cap > 0 && items.len() > cap {
        items.truncate(cap);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn empty_manifest() -> Manifest {
        Manifest {
            version: "1.0.0".into(),
            generated_at: Utc::now(),
            collections: BTreeMap::new(),
        }
    }

    #[test]
    fn validate_collection_accepts_none() {
        assert!(validate_collection(&empty_manifest(), None).is_ok());
    }

    #[test]
    fn validate_collection_rejects_unknown_name() {
        let err = validate_collection(&empty_manifest(), Some("nope")).expect_err("should fail");
        assert_eq!(err.kind().code(), "collection-not-found");
    }

    #[test]
    fn apply_cap_zero_means_unlimited() {
        assert_eq!(apply_cap(vec![1, 2, 3], 0), vec![1, 2, 3]);
    }

    #[test]
    fn apply_cap_truncates() {
        assert_eq!(apply_cap(vec![1, 2, 3], 2), vec![1, 2]);
    }
}

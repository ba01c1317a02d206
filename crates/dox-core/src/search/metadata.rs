//! Fuzzy metadata search over a loaded manifest, per spec.md §4.7.1.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::{apply_cap, validate_collection};
use crate::error::{Error, Result};
use crate::types::{Manifest, Outline};

/// One scored metadata match, deduplicated to at most one per
/// `(collection, path)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataMatch {
    /// The collection (source) name.
    pub collection: String,
    /// File path relative to the collection's output subdirectory.
    pub path: String,
    /// Which field produced the highest-scoring match (`path`, `description`,
    /// a heading text, or an export name).
    pub field: String,
    /// The matched text.
    pub value: String,
    /// Fuzzy match score; higher is a better match.
    pub score: i64,
}

/// Runs a fuzzy search over every file's path, description, headings, and
/// export names across `manifest`, optionally restricted to one
/// `collection`. Returns at most `cap` results (`0` = unlimited), sorted
/// by score descending, then collection ascending, then path ascending.
///
/// # Errors
///
/// Returns [`crate::error::ErrorKind::InvalidArgs`] if `query` is empty
/// after trimming, or [`crate::error::ErrorKind::CollectionNotFound`] if
/// `collection` names a collection absent from `manifest`.
pub fn metadata_search(
    manifest: &Manifest,
    query: &str,
    collection: Option<&str>,
    cap: usize,
) -> Result<Vec<MetadataMatch>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::invalid_args("search query must not be empty"));
    }
    validate_collection(manifest, collection)?;

    let matcher = SkimMatcherV2::default();
    let mut best: Vec<MetadataMatch> = Vec::new();

    for (name, coll) in &manifest.collections {
        if collection.is_some_and(|c| c != name) {
            continue;
        }
        for file in &coll.files {
            let mut candidates: Vec<(&str, &str)> = vec![("path", file.path.as_str())];
            if !file.description.is_empty() {
                candidates.push(("description", file.description.as_str()));
            }
            match &file.outline {
                Outline::Headings { items } => {
                    for item in items {
                        candidates.push(("heading", item.text.as_str()));
                    }
                },
                Outline::Exports { items } => {
                    for item in items {
                        candidates.push(("export", item.name.as_str()));
                    }
                },
                Outline::None => {},
            }

            let mut top: Option<MetadataMatch> = None;
            for (field, value) in candidates {
                let Some(score) = matcher.fuzzy_match(value, query) else {
                    continue;
                };
                if score < 0 {
                    continue;
                }
                if top.as_ref().is_none_or(|t| score > t.score) {
                    top = Some(MetadataMatch {
                        collection: name.clone(),
                        path: file.path.clone(),
                        field: field.to_string(),
                        value: value.to_string(),
                        score,
                    });
                }
            }
            if let Some(m) = top {
                best.push(m);
            }
        }
    }

    best.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.collection.cmp(&b.collection))
            .then_with(|| a.path.cmp(&b.path))
    });

    Ok(apply_cap(best, cap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    use crate::types::{Collection, FileRecord, HeadingItem};

    fn manifest_with(files: Vec<(&str, &str, &str)>) -> Manifest {
        let mut collections = BTreeMap::new();
        let mut by_collection: BTreeMap<String, Vec<FileRecord>> = BTreeMap::new();
        for (collection, path, description) in files {
            by_collection.entry(collection.to_string()).or_default().push(FileRecord {
                path: path.to_string(),
                r#type: "md".to_string(),
                size: 10,
                lines: 1,
                modified: Utc::now(),
                description: description.to_string(),
                component: None,
                warning: None,
                outline: Outline::Headings {
                    items: vec![HeadingItem {
                        level: 1,
                        text: "Getting Started".to_string(),
                        line: 1,
                    }],
                },
            });
        }
        for (name, files) in by_collection {
            let file_count = files.len();
            collections.insert(
                name.clone(),
                Collection {
                    name: name.clone(),
                    output_subdir: name,
                    kind: "direct-url".to_string(),
                    origin: "https://example.test".to_string(),
                    path: "https://example.test".to_string(),
                    r#ref: String::new(),
                    last_sync: Utc::now(),
                    file_count,
                    total_size: 10,
                    skipped: 0,
                    files,
                },
            );
        }
        Manifest {
            version: "1.0.0".to_string(),
            generated_at: Utc::now(),
            collections,
        }
    }

    #[test]
    fn empty_query_is_invalid() {
        let manifest = manifest_with(vec![("react", "guide.md", "React guide")]);
        let err = metadata_search(&manifest, "   ", None, 0).expect_err("should fail");
        assert_eq!(err.kind().code(), "invalid-args");
    }

    #[test]
    fn unknown_collection_filter_errors() {
        let manifest = manifest_with(vec![("react", "guide.md", "React guide")]);
        let err = metadata_search(&manifest, "guide", Some("vue"), 0).expect_err("should fail");
        assert_eq!(err.kind().code(), "collection-not-found");
    }

    #[test]
    fn matches_on_path_and_description() {
        let manifest = manifest_with(vec![("react", "guide.md", "React guide")]);
        let results = metadata_search(&manifest, "guide", None, 0).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, "guide.md");
    }

    #[test]
    fn dedupes_by_collection_and_path_keeping_best_score() {
        let manifest = manifest_with(vec![("react", "guide.md", "React guide to hooks")]);
        let results = metadata_search(&manifest, "guide", None, 0).expect("search");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn cap_limits_result_count() {
        let manifest = manifest_with(vec![
            ("react", "a-guide.md", "a guide"),
            ("react", "b-guide.md", "b guide"),
            ("react", "c-guide.md", "c guide"),
        ]);
        let results = metadata_search(&manifest, "guide", None, 2).expect("search");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn collection_filter_restricts_results() {
        let manifest = manifest_with(vec![
            ("react", "guide.md", "React guide"),
            ("vue", "guide.md", "Vue guide"),
        ]);
        let results = metadata_search(&manifest, "guide", Some("vue"), 0).expect("search");
        assert!(results.iter().all(|r| r.collection == "vue"));
    }

    #[test]
    fn sorted_by_score_then_collection_then_path() {
        let manifest = manifest_with(vec![
            ("b-collection", "guide.md", "guide"),
            ("a-collection", "guide.md", "guide"),
        ]);
        let results = metadata_search(&manifest, "guide", None, 0).expect("search");
        assert_eq!(results[0].collection, "a-collection");
        assert_eq!(results[1].collection, "b-collection");
    }
}

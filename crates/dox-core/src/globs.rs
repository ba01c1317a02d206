//! Include/exclude glob matching for repository source file selection.
//!
//! Uses `globset`'s `**`-capable doublestar matching, per spec.md §4.4.3.
//! A path is kept iff it matches any include glob AND no exclude glob.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::{Error, Result};

/// A compiled include/exclude glob pair for one source.
pub struct GlobFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl GlobFilter {
    /// Compiles `include`/`exclude` glob pattern lists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ErrorKind::ConfigInvalid`] if any pattern
    /// fails to parse.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = build_set(include)?;
        let exclude = build_set(exclude)?;
        Ok(Self { include, exclude })
    }

    /// Returns `true` if `path` matches at least one include pattern and
    /// no exclude pattern.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            Error::config_invalid(format!("invalid glob `{pattern}`: {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::config_invalid(format!("failed to build glob set: {e}")))
}

/// Normalizes a repository path the way spec.md §4.4.3 defines: trim,
/// strip leading/trailing `/`, collapse `.` segments.
#[must_use]
pub fn normalize_repo_path(path: &str) -> String {
    path.trim()
        .trim_matches('/')
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Computes the relative path of `full_repo_path` under `base`, per
/// spec.md §4.4.3: the portion after `base + '/'`, or the full path if
/// `base` is empty.
#[must_use]
pub fn relative_under_base<'a>(full_repo_path: &'a str, base: &str) -> Option<&'a str> {
    let base = normalize_repo_path(base);
    if base.is_empty() {
        return Some(full_repo_path.trim_start_matches('/'));
    }
    let prefix = format!("{base}/");
    full_repo_path.strip_prefix(&prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_any_include_and_no_exclude() {
        let filter = GlobFilter::new(
            &["**/*.md".to_string(), "**/*.mdx".to_string()],
            &["**/internal/**".to_string()],
        )
        .expect("filter");
        assert!(filter.is_match("docs/guide.md"));
        assert!(filter.is_match("docs/nested/guide.mdx"));
        assert!(!filter.is_match("docs/guide.png"));
        assert!(!filter.is_match("docs/internal/secret.md"));
    }

    #[test]
    fn invalid_glob_is_config_invalid() {
        let err = GlobFilter::new(&["[".to_string()], &[]).expect_err("should fail");
        assert_eq!(err.kind().code(), "config-invalid");
    }

    #[test]
    fn normalize_strips_slashes_and_dot_segments() {
        assert_eq!(normalize_repo_path("/docs/./guide/"), "docs/guide");
        assert_eq!(normalize_repo_path("  docs  "), "docs");
        assert_eq!(normalize_repo_path(""), "");
    }

    #[test]
    fn relative_under_base_strips_prefix() {
        assert_eq!(
            relative_under_base("docs/guide/intro.md", "docs/guide"),
            Some("intro.md")
        );
        assert_eq!(relative_under_base("docs/other.md", "docs/guide"), None);
        assert_eq!(
            relative_under_base("readme.md", ""),
            Some("readme.md")
        );
    }
}

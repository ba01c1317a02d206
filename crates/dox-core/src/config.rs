//! Configuration file loading: `dox.toml`/`.dox.toml` discovery and
//! parsing, per spec.md §6.
//!
//! This module is intentionally thin — spec.md §1 scopes config loading
//! as an external collaborator to the sync/manifest/search core, so the
//! only validation performed here is the range checks the spec calls
//! out explicitly (`max_parallel`). Everything else is a direct
//! `serde` + `toml` deserialization.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::SourceDescriptor;

pub use crate::types::SourceKind;

/// Default output root, relative to the config file's directory.
const DEFAULT_OUTPUT: &str = ".dox";
/// Host assumed for `repository` sources that omit `host`.
const DEFAULT_HOST: &str = "github.com";

/// Candidate file names searched at each directory level while
/// discovering the config file.
const CONFIG_FILE_NAMES: &[&str] = &["dox.toml", ".dox.toml"];

/// Output table format for `dox list`/`dox search`/etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFormat {
    /// Aligned column output (the default).
    #[default]
    Table,
    /// Newline-delimited JSON objects.
    Json,
    /// Comma-separated values.
    Csv,
}

/// `[display]` table: table rendering defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Table row cap.
    pub default_limit: usize,
    /// Description truncation width.
    pub description_length: usize,
    /// Whether to render line numbers alongside headings/exports.
    pub line_numbers: bool,
    /// Output format.
    pub format: DisplayFormat,
    /// Ordered field list for tabular output.
    pub list_fields: Vec<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            description_length: 200,
            line_numbers: false,
            format: DisplayFormat::Table,
            list_fields: vec![
                "name".to_string(),
                "kind".to_string(),
                "files".to_string(),
                "last_sync".to_string(),
            ],
        }
    }
}

/// A fully resolved, validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute output root directory.
    pub output: PathBuf,
    /// Bearer token for the repository driver.
    pub github_token: Option<String>,
    /// Default concurrency cap (validated `1..=100`), if configured.
    pub max_parallel: Option<usize>,
    /// Global exclusion globs, unioned per-source with each source's own excludes.
    pub excludes: Vec<String>,
    /// Display/output defaults.
    pub display: DisplayConfig,
    /// Configured sources, keyed by name.
    pub sources: BTreeMap<String, SourceDescriptor>,
}

impl Config {
    /// Looks up a configured source by name.
    #[must_use]
    pub fn source(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources.get(name)
    }

    /// The output root directory, as an owned path.
    #[must_use]
    pub fn output_root(&self) -> PathBuf {
        self.output.clone()
    }

    /// The global exclude globs, to be unioned with each source's own.
    #[must_use]
    pub fn global_excludes(&self) -> &[String] {
        &self.excludes
    }

    /// Discovers and loads the nearest `dox.toml`/`.dox.toml`, walking
    /// up from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ErrorKind::ConfigNotFound`] if no config
    /// file is found, or [`crate::error::ErrorKind::ConfigInvalid`] if
    /// one is found but fails to parse or validate.
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let path = discover(&cwd).ok_or_else(|| {
            Error::config_not_found("no dox.toml or .dox.toml found")
                .with_hint("run `dox init` to create one")
        })?;
        Self::load_from(&path)
    }

    /// Loads and validates a config file at an explicit path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ErrorKind::ConfigInvalid`] if the file
    /// cannot be read, fails to parse, or violates a documented
    /// constraint (e.g. `max_parallel` out of `1..=100`).
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config_invalid(format!("{}: {e}", path.display())).with_context("path", path.display())
        })?;
        let raw: RawConfig = toml::from_str(&text)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        raw.into_config(&base_dir)
    }
}

/// Walks from `start` up to the filesystem root looking for a config
/// file, returning the first match.
#[must_use]
pub fn discover(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        for name in CONFIG_FILE_NAMES {
            let candidate = d.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        dir = d.parent();
    }
    None
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    output: Option<String>,
    github_token: Option<String>,
    max_parallel: Option<usize>,
    #[serde(default)]
    excludes: Vec<String>,
    #[serde(default)]
    display: DisplayConfig,
    #[serde(default)]
    sources: BTreeMap<String, RawSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawSource {
    #[serde(rename = "type")]
    kind: Option<String>,
    output_subdir: Option<String>,
    host: Option<String>,
    repo: Option<String>,
    r#ref: Option<String>,
    path: Option<String>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    url: Option<String>,
    filename: Option<String>,
}

impl RawConfig {
    fn into_config(self, base_dir: &Path) -> Result<Config> {
        let max_parallel = match self.max_parallel {
            Some(n) if !(1..=100).contains(&n) => {
                return Err(Error::config_invalid(format!(
                    "max_parallel must be in 1..=100, got {n}"
                ))
                .with_context("field", "max_parallel"));
            },
            other => other,
        };

        let output = self.output.as_deref().unwrap_or(DEFAULT_OUTPUT);
        let output = base_dir.join(output);

        let mut sources = BTreeMap::new();
        for (name, raw) in self.sources {
            let descriptor = raw.into_descriptor(name.clone())?;
            sources.insert(name, descriptor);
        }

        Ok(Config {
            output,
            github_token: self.github_token,
            max_parallel,
            excludes: self.excludes,
            display: self.display,
            sources,
        })
    }
}

impl RawSource {
    fn into_descriptor(self, name: String) -> Result<SourceDescriptor> {
        let kind_tag = self.kind.clone();
        let has_url = self.url.is_some();
        let has_repo = self.repo.is_some();

        let (kind, output_subdir) = match kind_tag.as_deref() {
            Some("direct-url" | "url") => self.into_direct_url(&name)?,
            Some("repository" | "repo") => self.into_repository(&name)?,
            Some(other) => {
                return Err(Error::unknown_source_type(format!(
                    "unrecognized source type `{other}`"
                ))
                .with_context("source", &name));
            },
            None if has_url => self.into_direct_url(&name)?,
            None if has_repo => self.into_repository(&name)?,
            None => {
                return Err(Error::config_invalid(
                    "source must set either `url` or `repo`",
                )
                .with_context("source", &name));
            },
        };

        Ok(SourceDescriptor {
            name,
            output_subdir,
            kind,
        })
    }

    fn into_direct_url(self, name: &str) -> Result<(SourceKind, Option<String>)> {
        let url = self.url.ok_or_else(|| {
            Error::config_invalid("direct-url source requires `url`").with_context("source", name)
        })?;
        Ok((
            SourceKind::DirectUrl {
                url,
                filename: self.filename,
            },
            self.output_subdir,
        ))
    }

    fn into_repository(self, name: &str) -> Result<(SourceKind, Option<String>)> {
        let repo = self.repo.ok_or_else(|| {
            Error::config_invalid("repository source requires `repo`").with_context("source", name)
        })?;
        let path = self.path.unwrap_or_default();
        Ok((
            SourceKind::Repository {
                host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                repo,
                r#ref: self.r#ref,
                path,
                include: self.include,
                exclude: self.exclude,
            },
            self.output_subdir,
        ))
    }
}

#[cfg(test)]
impl Config {
    /// Builds a minimal config with `direct-url` sources for the given
    /// names, for use by sync-engine unit tests.
    pub(crate) fn test_with_sources(names: &[&str]) -> Self {
        let mut sources = BTreeMap::new();
        for n in names {
            sources.insert(
                (*n).to_string(),
                SourceDescriptor {
                    name: (*n).to_string(),
                    output_subdir: None,
                    kind: SourceKind::DirectUrl {
                        url: format!("https://example.test/{n}.txt"),
                        filename: None,
                    },
                },
            );
        }
        Self {
            output: PathBuf::from(".dox"),
            github_token: None,
            max_parallel: None,
            excludes: Vec::new(),
            display: DisplayConfig::default(),
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_walks_up_to_find_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(dir.path().join("dox.toml"), "").expect("write");

        let found = discover(&nested).expect("found");
        assert_eq!(found, dir.path().join("dox.toml"));
    }

    #[test]
    fn discover_prefers_dotfile_when_present_in_same_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("dox.toml"), "").expect("write");
        std::fs::write(dir.path().join(".dox.toml"), "").expect("write");
        let found = discover(dir.path()).expect("found");
        assert_eq!(found.file_name().unwrap(), "dox.toml");
    }

    #[test]
    fn discover_returns_none_when_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(discover(dir.path()).is_none());
    }

    #[test]
    fn loads_minimal_config_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dox.toml");
        std::fs::write(&path, "").expect("write");
        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.output, dir.path().join(DEFAULT_OUTPUT));
        assert!(config.sources.is_empty());
        assert_eq!(config.display.default_limit, 50);
    }

    #[test]
    fn infers_direct_url_type_from_url_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dox.toml");
        std::fs::write(
            &path,
            r#"
            [sources.react]
            url = "https://react.dev/llms.txt"
            "#,
        )
        .expect("write");
        let config = Config::load_from(&path).expect("load");
        match &config.source("react").expect("source").kind {
            SourceKind::DirectUrl { url, .. } => assert_eq!(url, "https://react.dev/llms.txt"),
            SourceKind::Repository { .. } => panic!("wrong kind"),
        }
    }

    #[test]
    fn infers_repository_type_and_defaults_host() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dox.toml");
        std::fs::write(
            &path,
            r#"
            [sources.vue]
            repo = "vuejs/docs"
            path = "src"
            "#,
        )
        .expect("write");
        let config = Config::load_from(&path).expect("load");
        match &config.source("vue").expect("source").kind {
            SourceKind::Repository { host, repo, .. } => {
                assert_eq!(host, "github.com");
                assert_eq!(repo, "vuejs/docs");
            },
            SourceKind::DirectUrl { .. } => panic!("wrong kind"),
        }
    }

    #[test]
    fn source_with_neither_url_nor_repo_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dox.toml");
        std::fs::write(&path, "[sources.bad]\n").expect("write");
        let err = Config::load_from(&path).expect_err("should fail");
        assert_eq!(err.kind().code(), "config-invalid");
    }

    #[test]
    fn unknown_source_type_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dox.toml");
        std::fs::write(&path, "[sources.bad]\ntype = \"ftp\"\n").expect("write");
        let err = Config::load_from(&path).expect_err("should fail");
        assert_eq!(err.kind().code(), "unknown-source-type");
    }

    #[test]
    fn max_parallel_out_of_range_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dox.toml");
        std::fs::write(&path, "max_parallel = 0\n").expect("write");
        let err = Config::load_from(&path).expect_err("should fail");
        assert_eq!(err.kind().code(), "config-invalid");
    }

    #[test]
    fn output_resolves_relative_to_config_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dox.toml");
        std::fs::write(&path, "output = \"cache\"\n").expect("write");
        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.output, dir.path().join("cache"));
    }

    #[test]
    fn missing_config_file_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Config::load_from(&dir.path().join("nope.toml")).expect_err("should fail");
        assert_eq!(err.kind().code(), "config-invalid");
    }
}

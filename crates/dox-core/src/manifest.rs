//! Manifest generator: walks each collection's output subdirectory,
//! dispatches every file to the matching parser, and persists the
//! versioned JSON index, per spec.md §4.6.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::detect::{self, FileType};
use crate::error::Result;
use crate::lock::LOCK_FILE_NAME;
use crate::parser;
use crate::types::{Collection, FileRecord, Lock, LockEntry, Manifest, Outline, MANIFEST_VERSION};

/// Name of the manifest file within the output root.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Files larger than this are recorded with `warning = file_too_large`
/// and never read into memory.
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Regenerates the manifest for every configured source whose output
/// subdirectory exists, and writes it atomically to
/// `{output_root}/manifest.json`.
///
/// # Errors
///
/// Propagates I/O failures walking the tree or writing the manifest.
pub fn generate(config: &Config, lock: &Lock) -> Result<Manifest> {
    let output_root = config.output_root();
    let mut collections = std::collections::BTreeMap::new();

    let mut names: Vec<&String> = config.sources.keys().collect();
    names.sort();

    for name in names {
        let descriptor = &config.sources[name];
        let subdir = descriptor.output_dir().to_string();
        let dir = output_root.join(&subdir);
        if !dir.is_dir() {
            continue;
        }

        let lock_entry = lock.sources.get(name);
        let collection = build_collection(descriptor, &dir, &subdir, lock_entry)?;
        collections.insert(name.clone(), collection);
    }

    let manifest = Manifest {
        version: MANIFEST_VERSION.to_string(),
        generated_at: now(),
        collections,
    };

    write(&output_root, &manifest)?;
    Ok(manifest)
}

/// Loads the manifest from `{output_root}/manifest.json`.
///
/// # Errors
///
/// Returns [`crate::error::ErrorKind::ManifestNotFound`] if the file is
/// absent, or [`crate::error::ErrorKind::ManifestCorrupt`] if it fails
/// to parse.
pub fn load(output_root: &Path) -> Result<Manifest> {
    let path = output_root.join(MANIFEST_FILE_NAME);
    let bytes = std::fs::read(&path).map_err(|_| {
        crate::error::Error::manifest_not_found(format!("{} not found", path.display()))
            .with_hint("run `dox sync` first")
            .with_context("path", path.display())
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        crate::error::Error::manifest_corrupt(e.to_string()).with_context("path", path.display())
    })
}

fn write(output_root: &Path, manifest: &Manifest) -> Result<()> {
    let mut json = serde_json::to_vec_pretty(manifest)
        .map_err(|e| crate::error::Error::manifest_write_error(e.to_string()))?;
    json.push(b'\n');
    let path = output_root.join(MANIFEST_FILE_NAME);
    crate::atomic::write_atomic(&path, &json).map_err(|e| {
        crate::error::Error::manifest_write_error(e.to_string()).with_context("path", path.display())
    })
}

fn build_collection(
    descriptor: &crate::types::SourceDescriptor,
    dir: &Path,
    subdir: &str,
    lock_entry: Option<&LockEntry>,
) -> Result<Collection> {
    let (kind, origin, path, git_ref) = describe(descriptor);

    let mut files = Vec::new();
    let mut total_size = 0u64;
    let mut skipped = 0usize;
    walk(dir, dir, &mut |rel, full| {
        match build_record(&rel, full)? {
            Some(record) => {
                total_size += record.size;
                files.push(record);
            },
            None => skipped += 1,
        }
        Ok(())
    })?;

    let last_sync = lock_entry.map_or_else(now, LockEntry::synced_at);

    Ok(Collection {
        name: descriptor.name.clone(),
        output_subdir: subdir.to_string(),
        kind,
        origin,
        path,
        r#ref: git_ref,
        last_sync,
        file_count: files.len(),
        total_size,
        skipped,
        files,
    })
}

fn describe(descriptor: &crate::types::SourceDescriptor) -> (String, String, String, String) {
    match &descriptor.kind {
        crate::types::SourceKind::Repository {
            host, repo, path, r#ref, ..
        } => (
            "repository".to_string(),
            format!("{host}/{repo}"),
            path.clone(),
            r#ref.clone().unwrap_or_default(),
        ),
        crate::types::SourceKind::DirectUrl { url, .. } => {
            ("direct-url".to_string(), url.clone(), url.clone(), String::new())
        },
    }
}

/// Depth-first walk of `dir` relative to `root`, skipping the manifest
/// and lock files themselves. Deterministic for a given tree: entries
/// are visited in the order `read_dir` yields them, sorted by name at
/// each level so the walk (and therefore the manifest) is reproducible
/// across platforms.
fn walk(
    root: &Path,
    dir: &Path,
    on_file: &mut dyn FnMut(String, &Path) -> Result<()>,
) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(std::result::Result::ok).collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(root, &path, on_file)?;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name == MANIFEST_FILE_NAME || file_name == LOCK_FILE_NAME {
            continue;
        }
        let rel = relative_slash_path(root, &path);
        on_file(rel, &path)?;
    }
    Ok(())
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds one file record, or `None` if the file was skipped (binary
/// content detected after the size/NUL preflight).
fn build_record(rel: &str, full_path: &Path) -> Result<Option<FileRecord>> {
    let metadata = std::fs::metadata(full_path)?;
    let size = metadata.len();
    let modified = metadata
        .modified()
        .ok()
        .map_or_else(now, DateTime::<Utc>::from);

    if size > MAX_FILE_SIZE {
        return Ok(Some(FileRecord {
            path: rel.to_string(),
            r#type: "unknown".to_string(),
            size,
            lines: 0,
            modified,
            description: String::new(),
            component: None,
            warning: Some("file_too_large".to_string()),
            outline: Outline::None,
        }));
    }

    let bytes = std::fs::read(full_path)?;
    if detect::is_binary(&bytes) {
        return Ok(None);
    }

    let path_buf = PathBuf::from(rel);
    match parser::dispatch(&path_buf, &bytes) {
        Some(Ok(parsed)) => Ok(Some(FileRecord {
            path: rel.to_string(),
            r#type: FileType::from_path(&path_buf).as_tag().to_string(),
            size,
            lines: parsed.lines,
            modified,
            description: parsed.description,
            component: parsed.component.map(str::to_string),
            warning: None,
            outline: parsed.outline,
        })),
        Some(Err(_)) | None => {
            let lines = bytes.iter().filter(|&&b| b == b'\n').count() + 1;
            Ok(Some(FileRecord {
                path: rel.to_string(),
                r#type: "unknown".to_string(),
                size,
                lines,
                modified,
                description: String::new(),
                component: None,
                warning: None,
                outline: Outline::None,
            }))
        },
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

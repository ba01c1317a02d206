//! Per-output-directory lock store: `.dox.lock`.
//!
//! The lock file records, per source, the integrity keys needed to decide
//! whether a remote has changed since the last sync (tree SHA / blob SHAs
//! for repositories, `ETag`/`Last-Modified` for direct URLs). It is always
//! rewritten in full and moved into place with `rename` — never patched.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Lock, LockEntry};

/// Name of the lock file within an output directory.
pub const LOCK_FILE_NAME: &str = ".dox.lock";

fn lock_path(output_dir: &Path) -> PathBuf {
    output_dir.join(LOCK_FILE_NAME)
}

/// Loads the lock file from `output_dir`, returning an empty lock if it
/// does not exist.
///
/// # Errors
///
/// Returns [`crate::error::ErrorKind::LockCorrupt`] if the file exists but
/// is not valid JSON matching the lock schema.
pub fn load(output_dir: &Path) -> Result<Lock> {
    let path = lock_path(output_dir);
    let bytes = match fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Lock::empty()),
        Err(e) => return Err(Error::from(e).with_context("path", path.display())),
    };
    serde_json::from_slice(&bytes).map_err(|e| {
        Error::lock_corrupt(format!("{}: {e}", path.display()))
            .with_hint("delete .dox.lock and re-sync")
            .with_context("path", path.display())
    })
}

/// Persists `lock` atomically: write to a sibling temp file, then `rename`
/// over the target. On any write failure the temp file is removed.
///
/// # Errors
///
/// Returns [`crate::error::ErrorKind::LockWriteError`] on any I/O failure.
pub fn save(output_dir: &Path, lock: &Lock) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    let path = lock_path(output_dir);
    let json = serde_json::to_vec_pretty(lock)
        .map_err(|e| Error::lock_write_error(e.to_string()))?;
    crate::atomic::write_atomic(&path, &json).map_err(|e| {
        Error::lock_write_error(e.to_string()).with_context("path", path.display())
    })?;
    debug!(path = %path.display(), "saved lock");
    Ok(())
}

/// Returns the entry for `name`, if one exists.
#[must_use]
pub fn get<'a>(lock: &'a Lock, name: &str) -> Option<&'a LockEntry> {
    lock.sources.get(name)
}

/// Inserts or replaces the entry for `name`.
pub fn set(lock: &mut Lock, name: impl Into<String>, entry: LockEntry) {
    lock.sources.insert(name.into(), entry);
}

/// Removes the entry for `name`, if present.
pub fn remove(lock: &mut Lock, name: &str) {
    lock.sources.remove(name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    #[test]
    fn missing_lock_loads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lock = load(dir.path()).expect("load");
        assert_eq!(lock.version, 1);
        assert!(lock.sources.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut lock = Lock::empty();
        set(
            &mut lock,
            "react",
            LockEntry::DirectUrl {
                synced_at: Utc::now(),
                etag: Some("v1".into()),
                last_modified: None,
            },
        );
        save(dir.path(), &lock).expect("save");
        let reloaded = load(dir.path()).expect("load");
        assert_eq!(reloaded.sources.len(), 1);
        assert!(get(&reloaded, "react").is_some());
        assert!(get(&reloaded, "vue").is_none());
    }

    #[test]
    fn corrupt_lock_file_surfaces_lock_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(lock_path(dir.path()), b"not json").expect("write");
        let err = load(dir.path()).expect_err("should fail");
        assert_eq!(err.kind().code(), "lock-corrupt");
    }

    #[test]
    fn remove_drops_entry() {
        let mut lock = Lock::empty();
        set(
            &mut lock,
            "react",
            LockEntry::DirectUrl {
                synced_at: Utc::now(),
                etag: None,
                last_modified: None,
            },
        );
        remove(&mut lock, "react");
        assert!(lock.sources.is_empty());
    }

    #[test]
    fn save_creates_missing_output_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("nested/out");
        save(&nested, &Lock::empty()).expect("save");
        assert!(nested.join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn lock_entry_files_map_preserved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut files = BTreeMap::new();
        files.insert("a.md".to_string(), "sha-a".to_string());
        let mut lock = Lock::empty();
        set(
            &mut lock,
            "docs",
            LockEntry::Repository {
                synced_at: Utc::now(),
                tree_sha: "T".into(),
                ref_resolved: "main".into(),
                files,
            },
        );
        save(dir.path(), &lock).expect("save");
        let reloaded = load(dir.path()).expect("load");
        match get(&reloaded, "docs").expect("entry") {
            LockEntry::Repository { files, .. } => {
                assert_eq!(files.get("a.md").map(String::as_str), Some("sha-a"));
            },
            LockEntry::DirectUrl { .. } => panic!("wrong variant"),
        }
    }
}

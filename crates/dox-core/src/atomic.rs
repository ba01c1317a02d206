//! Atomic file writes: write-temp-then-rename.
//!
//! Every persisted artifact in `dox` (lock file, manifest, downloaded
//! documents) goes through [`write_atomic`] so a reader never observes a
//! partially-written file, even if the process is killed mid-write.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Writes `bytes` to `target` atomically.
///
/// Creates a temp file alongside `target` (same directory, so the final
/// `rename` is same-filesystem and therefore atomic), writes and flushes
/// it, then renames it over `target`. Intermediate directories are created
/// with mode `0o750`. On any failure the temp file is removed before the
/// error propagates.
///
/// # Errors
///
/// Propagates any I/O failure creating directories, writing, or renaming.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    create_dir_all(dir)?;

    let tmp_path = tmp_path_for(target);
    let result = (|| -> Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        #[cfg(target_os = "windows")]
        if target.exists() {
            fs::remove_file(target)?;
        }

        fs::rename(&tmp_path, target)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn tmp_path_for(target: &Path) -> std::path::PathBuf {
    let suffix: u64 = {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        nanos ^ (std::process::id() as u64)
    };
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tmp".to_string());
    target.with_file_name(format!(".{file_name}.{suffix:x}.tmp"))
}

/// `fs::create_dir_all` with `0o750` permissions on the created path (unix only).
#[cfg(unix)]
fn create_dir_all(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::create_dir_all(dir)?;
    if let Ok(meta) = fs::metadata(dir) {
        let mut perms = meta.permissions();
        perms.set_mode(0o750);
        let _ = fs::set_permissions(dir, perms);
    }
    Ok(())
}

#[cfg(not(unix))]
fn create_dir_all(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

//! Atomic text I/O and one-shot backups

use std::fs::{self, OpenOptions};
use std::io::Write;

use crate::{Error, NormalizedPath, Result};

/// Suffix appended to a file name to form its backup sibling.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// The temp file lives next to the target so the rename never crosses
/// filesystems.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
    drop(temp_file);

    if let Err(e) = fs::rename(&temp_path, &native_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&native_path, e));
    }

    tracing::trace!(path = %path, bytes = content.len(), "atomic write complete");
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Path of the backup sibling for `path`.
pub fn backup_path(path: &NormalizedPath) -> NormalizedPath {
    NormalizedPath::new(format!("{}{}", path.as_str(), BACKUP_SUFFIX))
}

/// Copy `path` to its `.bak` sibling unless a backup already exists.
///
/// Returns `true` when a new backup was written. The first backup is the
/// pristine file and later runs never overwrite it.
pub fn backup_once(path: &NormalizedPath) -> Result<bool> {
    let backup = backup_path(path);
    if backup.exists() {
        return Ok(false);
    }

    fs::copy(path.to_native(), backup.to_native()).map_err(|e| Error::io(backup.to_native(), e))?;
    tracing::debug!(backup = %backup, "created backup");
    Ok(true)
}

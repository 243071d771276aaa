use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::snapshot::Snapshot;

/// `<dir>/<base>_<n>.<ext>`
pub fn backup_path(dir: &Path, base: &str, ext: &str, n: u32) -> PathBuf {
    dir.join(format!("{base}_{n}.{ext}"))
}

/// The first `<base>_<n>.<ext>` in `dir` that does not exist yet.
pub fn next_backup_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let mut n = 0;
    loop {
        let path = backup_path(dir, base, ext, n);
        if !path.exists() {
            return path;
        }
        n += 1;
    }
}

/// Writes `snapshot` to the first free backup file name and returns its path.
///
/// Existing files are never overwritten, even if one appears between the
/// existence check and the write.
pub fn write_backup(dir: &Path, base: &str, ext: &str, snapshot: &Snapshot) -> Result<PathBuf> {
    let content = serde_json::to_string_pretty(snapshot)?;
    let mut path = next_backup_path(dir, base, ext);
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(content.as_bytes())?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                path = next_backup_path(dir, base, ext);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

//! Atomic file write using the write-rename pattern.
//!
//! Writes data to a temporary sibling (`{path}.tmp`), calls `sync_all()`
//! to flush bytes to persistent storage, then renames the temp file over
//! the final path. A crash during the write cannot corrupt an existing
//! world file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically writes `data` to `path`.
///
/// 1. Write to `{path}.tmp`
/// 2. `sync_all()` to flush to disk
/// 3. `rename` temp to final path (atomic on POSIX; near-atomic on Windows)
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp_path: PathBuf = path.to_path_buf();
    tmp_path.as_mut_os_string().push(".tmp");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

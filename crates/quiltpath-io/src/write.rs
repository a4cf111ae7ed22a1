//! Atomic replacement of export destinations.
//!
//! Output is serialized fully in memory, written to a temporary file in
//! the destination directory, synced, and then renamed over the target.
//! A failure at any step leaves the previous file untouched.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use quiltpath_export::{ExportOptions, ExportProfile, export};
use quiltpath_motion::MotionPath;

use crate::IoError;

/// Replace `dest` with `bytes` atomically.
///
/// # Errors
///
/// Returns [`IoError::Write`] if the temporary file cannot be created,
/// written or synced, and [`IoError::Persist`] if it cannot be renamed
/// over `dest`.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), IoError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_err = |source: std::io::Error| IoError::Write {
        path: dest.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    tmp.persist(dest).map_err(|e| IoError::Persist {
        path: dest.to_path_buf(),
        source: e.error,
    })?;

    tracing::info!(path = %dest.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

/// Serialize `path` with `profile` and write it atomically to `dest`.
///
/// Returns the number of bytes written. Nothing touches the disk if
/// serialization fails.
///
/// # Errors
///
/// Returns [`IoError::Export`] if serialization fails, or any error of
/// [`write_atomic`].
pub fn export_to_file(
    path: &MotionPath,
    profile: &ExportProfile,
    options: &ExportOptions,
    dest: &Path,
) -> Result<usize, IoError> {
    let bytes = export(path, profile, options)?;
    write_atomic(dest, &bytes)?;
    Ok(bytes.len())
}

//! Atomic file writes.
//!
//! Content goes to a sibling temporary file (`<name>.tmp`) which is then renamed
//! over the target. Readers see either the previous file or the complete new
//! one, and a failed write leaves the previous file in place.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Write `content` to `target`, creating parent directories as needed.
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::io(
                format!("Failed to create directory '{}'", parent.display()),
                e,
            )
        })?;
    }

    let temp_path = temp_path_for(target);
    fs::write(&temp_path, content).map_err(|e| {
        cleanup_temp_file(&temp_path);
        Error::io(
            format!("Failed to write temporary file '{}'", temp_path.display()),
            e,
        )
    })?;

    fs::rename(&temp_path, target).map_err(|e| {
        cleanup_temp_file(&temp_path);
        Error::io(
            format!(
                "Failed to rename '{}' to '{}'",
                temp_path.display(),
                target.display()
            ),
            e,
        )
    })
}

fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    target.with_file_name(name)
}

/// Best-effort; we are already failing.
fn cleanup_temp_file(temp_path: &Path) {
    if temp_path.exists() {
        if let Err(e) = fs::remove_file(temp_path) {
            tracing::warn!(
                path = %temp_path.display(),
                error = %e,
                "failed to clean up temporary file"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_through_missing_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("public/js/all.js");

        write_atomic(&target, b"var all").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "var all");
        assert!(!dir.path().join("public/js/all.js.tmp").exists());
    }

    #[test]
    fn replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("mix-manifest.json");
        fs::write(&target, "{}").unwrap();

        write_atomic(&target, b"{\"/a.js\": \"/a.js\"}").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "{\"/a.js\": \"/a.js\"}");
    }

    #[test]
    fn temp_file_sits_next_to_target() {
        assert_eq!(
            temp_path_for(Path::new("/srv/public/mix-manifest.json")),
            PathBuf::from("/srv/public/mix-manifest.json.tmp")
        );
    }
}

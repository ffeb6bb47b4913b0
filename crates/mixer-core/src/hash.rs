//! Content hashing for versioned assets.
//!
//! Tokens are a BLAKE3 digest of the file's bytes, hex-encoded and truncated.
//! Metadata (name, mtime, permissions) never contributes, so identical content
//! yields the same token on every machine.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::paths::{self, logical_from_physical};
use crate::{Error, Result};

/// Truncated content hash appended to manifest values as `?id=<token>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Get the token as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash raw bytes into a token of `len` hex characters (capped at 64).
pub fn hash_bytes(bytes: &[u8], len: usize) -> VersionToken {
    let digest = blake3::hash(bytes).to_hex();
    let hex = digest.as_str();
    let len = len.min(hex.len());
    VersionToken(hex[..len].to_string())
}

/// Hash a file's content.
pub fn hash_file(path: &Path, len: usize) -> Result<VersionToken> {
    let bytes = fs::read(path)
        .map_err(|e| Error::io(format!("Failed to hash '{}'", path.display()), e))?;
    Ok(hash_bytes(&bytes, len))
}

/// Append the version token to a logical path.
pub fn versioned_value(logical: &str, token: &VersionToken) -> String {
    format!("{}?id={}", logical, token)
}

/// Manifest keys opted into versioning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionedFileSet {
    /// Version every manifest entry
    pub all: bool,
    /// Keys resolved from explicit `version()` targets
    pub files: BTreeSet<String>,
}

impl VersionedFileSet {
    pub fn contains(&self, key: &str) -> bool {
        self.all || self.files.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        !self.all && self.files.is_empty()
    }
}

/// Resolves `version()` targets into concrete files.
pub struct Versioner<'a> {
    root: &'a Path,
    public_dir: &'a Path,
}

impl<'a> Versioner<'a> {
    pub fn new(root: &'a Path, public_dir: &'a Path) -> Self {
        Self { root, public_dir }
    }

    /// Expand a file or directory into the files it currently contains.
    ///
    /// Directories are walked recursively in file-name order. A target that
    /// does not exist resolves to nothing.
    pub fn version(&self, target: &Path) -> Result<Vec<PathBuf>> {
        let target = paths::resolve(self.root, target);

        if target.is_file() {
            return Ok(vec![target]);
        }

        if !target.is_dir() {
            tracing::warn!(path = %target.display(), "versioned path does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&target).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let message = format!("Failed to read versioned directory '{}'", target.display());
                Error::io(message, e.into())
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Build the versioned set for a build.
    ///
    /// Files outside the public directory cannot be served and are skipped.
    pub fn resolve_set(&self, all: bool, targets: &[PathBuf]) -> Result<VersionedFileSet> {
        let mut set = VersionedFileSet {
            all,
            files: BTreeSet::new(),
        };

        for target in targets {
            for file in self.version(target)? {
                match logical_from_physical(self.public_dir, &file) {
                    Some(key) => {
                        set.files.insert(key);
                    }
                    None => tracing::warn!(
                        path = %file.display(),
                        "versioned file is outside the public path, skipping"
                    ),
                }
            }
        }

        Ok(set)
    }
}

//! The asset manifest.
//!
//! Maps logical request paths (`/js/app.js`) to the paths that should be
//! served (`/js/app.js?id=<token>`). The manifest is read before a build,
//! reconciled against what the build produced and rewritten in full.
//!
//! Reconciliation rules:
//!
//! - entries for files the build touched are (re)written
//! - untouched entries survive while their file still exists, and are pruned
//!   otherwise
//! - versioning only ever changes values; keys are always the logical path

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use mixer_config::MixOptions;
use path_clean::PathClean;

use crate::engine::Stats;
use crate::hash::{VersionedFileSet, hash_file, versioned_value};
use crate::paths::{self, logical_from_physical, physical_from_logical, to_logical, to_url_path};
use crate::writer::write_atomic;
use crate::{Error, Result};

/// Logical path -> served path, ordered by key.
pub type ManifestMap = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    public_dir: PathBuf,
    public_prefix: String,
    hash_length: usize,
    added: BTreeSet<String>,
    versioned: VersionedFileSet,
}

impl Manifest {
    pub fn new(root: &Path, options: &MixOptions) -> Self {
        let public_dir = paths::resolve(root, &options.public_path);
        Self {
            path: public_dir.join(&options.manifest_name),
            public_dir,
            public_prefix: options.public_path_str(),
            hash_length: options.hash_length,
            added: BTreeSet::new(),
            versioned: VersionedFileSet::default(),
        }
    }

    /// Location of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// The persisted manifest, or an empty one when there is none yet.
    pub fn read(&self) -> Result<ManifestMap> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ManifestMap::new()),
            Err(e) => {
                return Err(Error::io(
                    format!("Failed to read manifest '{}'", self.path.display()),
                    e,
                ));
            }
        };

        serde_json::from_str(&content).map_err(|source| Error::ManifestParse {
            path: self.path.clone(),
            source,
        })
    }

    /// Logical key for a path reported by the engine or a task.
    pub fn normalize(&self, path: &str) -> String {
        let public_dir = to_url_path(&self.public_dir.to_string_lossy());
        to_logical(path, &[public_dir.as_str(), self.public_prefix.as_str()])
    }

    /// Record a file written outside the engine (copy and combine tasks).
    ///
    /// Returns `false` for files outside the public directory, which cannot be served.
    pub fn add(&mut self, physical: &Path) -> bool {
        match logical_from_physical(&self.public_dir, physical) {
            Some(key) => {
                self.added.insert(key);
                true
            }
            None => {
                tracing::debug!(path = %physical.display(), "not under the public path, not recorded");
                false
            }
        }
    }

    /// Keys to version in the next [`Manifest::transform`].
    pub fn set_versioned(&mut self, versioned: VersionedFileSet) {
        self.versioned = versioned;
    }

    /// Reconcile the previous manifest with a finished build and persist it.
    pub fn transform(&mut self, stats: &Stats) -> Result<ManifestMap> {
        let previous = self.read()?;

        let mut touched: BTreeSet<String> =
            stats.asset_paths().map(|path| self.normalize(path)).collect();
        touched.extend(self.added.iter().cloned());
        touched.extend(self.versioned.files.iter().cloned());

        let mut manifest = ManifestMap::new();
        for (key, value) in previous {
            if touched.contains(&key) {
                continue;
            }
            if physical_from_logical(&self.public_dir, &key).is_file() {
                manifest.insert(key, value);
            } else {
                tracing::debug!(key = %key, "pruning manifest entry for deleted file");
            }
        }
        for key in &touched {
            manifest.insert(key.clone(), key.clone());
        }

        for (key, value) in manifest.iter_mut() {
            if !self.versioned.contains(key) {
                continue;
            }
            let physical = physical_from_logical(&self.public_dir, key);
            let token = hash_file(&physical, self.hash_length)?;
            tracing::debug!(key = %key, token = %token, "versioned");
            *value = versioned_value(key, &token);
        }

        self.write(&manifest)?;
        tracing::info!(path = %self.path.display(), entries = manifest.len(), "manifest written");
        Ok(manifest)
    }

    /// Drop the entry whose served file is `physical`. Returns whether one was removed.
    pub fn remove(&self, physical: &Path) -> Result<bool> {
        let target = physical.to_path_buf().clean();
        let mut manifest = self.read()?;
        let before = manifest.len();
        manifest.retain(|_, value| physical_from_logical(&self.public_dir, value) != target);

        if manifest.len() == before {
            return Ok(false);
        }
        self.write(&manifest)?;
        Ok(true)
    }

    fn write(&self, manifest: &ManifestMap) -> Result<()> {
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| Error::io("Failed to serialize manifest", std::io::Error::other(e)))?;
        write_atomic(&self.path, json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChunkAssets;
    use tempfile::TempDir;

    const PREVIOUS: &str = r#"{"/js/app.js":"/js/app.js","/css/app.css":"/css/app.css","/css/forum.css":"/css/forum.css","/js/admin.js":"/js/admin.js"}"#;

    fn setup() -> (TempDir, Manifest) {
        let dir = TempDir::new().unwrap();
        let options = MixOptions::default();
        let manifest = Manifest::new(dir.path(), &options);
        fs::create_dir_all(dir.path().join("public")).unwrap();
        (dir, manifest)
    }

    fn write_file(dir: &TempDir, relative: &str, content: &str) {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn missing_manifest_reads_empty() {
        let (_dir, manifest) = setup();
        assert!(!manifest.exists());
        assert!(manifest.read().unwrap().is_empty());
    }

    #[test]
    fn reads_persisted_manifest() {
        let (dir, manifest) = setup();
        write_file(&dir, "public/mix-manifest.json", PREVIOUS);

        assert!(manifest.exists());
        let map = manifest.read().unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map["/css/forum.css"], "/css/forum.css");
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        let (dir, manifest) = setup();
        write_file(&dir, "public/mix-manifest.json", "{ not json");
        assert!(matches!(manifest.read().unwrap_err(), Error::ManifestParse { .. }));
    }

    #[test]
    fn transform_normalizes_engine_paths() {
        let (dir, mut manifest) = setup();
        for file in ["js/app.js", "css/app.css", "css/forum.css", "admin/js/manifest.js", "js/admin.js"] {
            write_file(&dir, &format!("public/{}", file), file);
        }

        let mut stats = Stats::default();
        stats.assets_by_chunk_name.insert(
            "app".into(),
            ChunkAssets::Many(vec![
                "/js/app.js".into(),
                "/css/app.css".into(),
                "/css/forum.css".into(),
                "\\admin\\js/manifest.js".into(),
            ]),
        );
        stats
            .assets_by_chunk_name
            .insert("admin".into(), ChunkAssets::One("/js/admin.js".into()));

        let map = manifest.transform(&stats).unwrap();
        let expected: ManifestMap = [
            "/admin/js/manifest.js",
            "/css/app.css",
            "/css/forum.css",
            "/js/admin.js",
            "/js/app.js",
        ]
        .iter()
        .map(|k| (k.to_string(), k.to_string()))
        .collect();
        assert_eq!(map, expected);
        assert_eq!(manifest.read().unwrap(), expected);
    }

    #[test]
    fn untouched_entries_survive_until_their_file_is_gone() {
        let (dir, mut manifest) = setup();
        write_file(&dir, "public/mix-manifest.json", PREVIOUS);
        write_file(&dir, "public/js/app.js", "var app");
        write_file(&dir, "public/css/app.css", "body {}");

        let map = manifest.transform(&Stats::default()).unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["/css/app.css", "/js/app.js"]);
    }

    #[test]
    fn versioning_changes_values_not_keys() {
        let (dir, mut manifest) = setup();
        write_file(&dir, "public/js/app.js", "var app");

        let mut stats = Stats::default();
        stats
            .assets_by_chunk_name
            .insert("app".into(), ChunkAssets::One("js/app.js".into()));
        manifest.set_versioned(VersionedFileSet {
            all: true,
            files: BTreeSet::new(),
        });

        let map = manifest.transform(&stats).unwrap();
        let value = &map["/js/app.js"];
        assert!(value.starts_with("/js/app.js?id="));
        assert_eq!(value.len(), "/js/app.js?id=".len() + 20);
    }

    #[test]
    fn missing_versioned_output_is_an_error() {
        let (_dir, mut manifest) = setup();
        let mut stats = Stats::default();
        stats
            .assets_by_chunk_name
            .insert("app".into(), ChunkAssets::One("/js/app.js".into()));
        manifest.set_versioned(VersionedFileSet {
            all: true,
            files: BTreeSet::new(),
        });

        assert!(matches!(manifest.transform(&stats).unwrap_err(), Error::Io { .. }));
        assert!(!manifest.exists());
    }

    #[test]
    fn added_files_are_recorded() {
        let (dir, mut manifest) = setup();
        write_file(&dir, "public/somewhere/app.js", "var app");

        assert!(manifest.add(&dir.path().join("public/somewhere/app.js")));
        assert!(!manifest.add(&dir.path().join("resources/app.js")));

        let map = manifest.transform(&Stats::default()).unwrap();
        assert_eq!(map["/somewhere/app.js"], "/somewhere/app.js");
    }

    #[test]
    fn remove_drops_entries_by_physical_path() {
        let (dir, manifest) = setup();
        write_file(&dir, "public/mix-manifest.json", PREVIOUS);

        let values: Vec<String> = manifest.read().unwrap().into_values().collect();
        for value in values {
            let physical = physical_from_logical(&dir.path().join("public"), &value);
            assert!(manifest.remove(&physical).unwrap());
        }

        assert!(manifest.read().unwrap().is_empty());
        assert!(!manifest.remove(&dir.path().join("public/js/app.js")).unwrap());
    }
}

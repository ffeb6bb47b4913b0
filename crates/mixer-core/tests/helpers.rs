//! Shared test utilities for mixer-core tests
//!
//! `FakeEngine` stands in for a real bundler: it honours the parts of a
//! `BuildConfig` the manifest depends on (entries, extraction targets and
//! split chunks) and writes deterministic files below `output.path`.

#![allow(dead_code)]

use mixer_core::{BuildConfig, ChunkAssets, CompileEngine, ManifestMap, Stats};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A project directory with the usual `resources/` sources.
pub fn project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    write(&dir, "resources/js/app.js", "console.log('app');");
    write(&dir, "resources/js/admin.js", "console.log('admin');");
    write(&dir, "resources/sass/app.scss", "$color: red; body { color: $color; }");
    write(&dir, "resources/less/forum.less", "@color: blue; a { color: @color; }");
    write(&dir, "resources/css/plain.css", "p { margin: 0; }");
    fs::create_dir_all(dir.path().join("public")).expect("create public");
    dir
}

/// Write `content` to `relative` below the project, creating directories.
pub fn write(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
    let path = dir.path().join(relative);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(&path, content).expect("write file");
    path
}

pub fn read(dir: &TempDir, relative: &str) -> String {
    fs::read_to_string(dir.path().join(relative)).expect("read file")
}

/// The manifest as persisted on disk.
pub fn manifest_on_disk(dir: &TempDir) -> ManifestMap {
    let content = fs::read_to_string(dir.path().join("public/mix-manifest.json")).expect("manifest");
    serde_json::from_str(&content).expect("manifest json")
}

pub fn keys(manifest: &ManifestMap) -> Vec<&str> {
    manifest.keys().map(String::as_str).collect()
}

/// The `?id=` token of a manifest value.
pub fn token(value: &str) -> &str {
    value
        .split_once("?id=")
        .map(|(_, token)| token)
        .expect("versioned value")
}

/// Bundler stand-in.
#[derive(Debug, Default)]
pub struct FakeEngine {
    /// Every configuration compiled so far
    pub configs: Vec<BuildConfig>,
    /// Reported as compile errors instead of writing anything
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: &str) -> Self {
        Self {
            errors: vec![error.to_string()],
            ..Self::default()
        }
    }

    pub fn last_config(&self) -> &BuildConfig {
        self.configs.last().expect("at least one compile")
    }

    fn source(context: &Path, src: &str) -> String {
        fs::read_to_string(context.join(src)).unwrap_or_else(|_| format!("/* {} */", src))
    }
}

impl CompileEngine for FakeEngine {
    fn compile(&mut self, config: &BuildConfig) -> mixer_core::Result<Stats> {
        self.configs.push(config.clone());
        if !self.errors.is_empty() {
            return Ok(Stats {
                errors: self.errors.clone(),
                ..Stats::default()
            });
        }

        // source -> extracted stylesheet
        let extracted: BTreeMap<&str, &str> = config
            .module
            .rules
            .iter()
            .flat_map(|rule| rule.loaders.targets())
            .filter_map(|target| {
                target
                    .include
                    .as_deref()
                    .map(|src| (src, target.filename.as_str()))
            })
            .collect();

        let public = &config.output.path;
        let mut assets_by_chunk_name = BTreeMap::new();

        for (name, sources) in &config.entry {
            let mut script = String::new();
            let mut assets = vec![format!("/{}.js", name)];

            for src in sources {
                let content = Self::source(&config.context, src);
                match extracted.get(src.as_str()) {
                    Some(css) => {
                        write_output(public, css, &content);
                        assets.push(format!("/{}", css));
                    }
                    None => {
                        script.push_str(&content);
                        script.push('\n');
                    }
                }
            }

            write_output(public, &format!("{}.js", name), &script);
            assets_by_chunk_name.insert(name.clone(), ChunkAssets::Many(assets));
        }

        if let Some(split) = config.plugin("split-chunks") {
            let names = split.options["names"].as_array().cloned().unwrap_or_default();
            for name in names.iter().filter_map(|n| n.as_str()) {
                if !config.entry.contains_key(name) {
                    let path = format!("{}.js", name);
                    write_output(public, &path, "/* runtime */");
                    assets_by_chunk_name.insert(name.to_string(), ChunkAssets::One(path));
                }
            }
        }

        Ok(Stats {
            assets_by_chunk_name,
            errors: Vec::new(),
            warnings: self.warnings.clone(),
        })
    }
}

fn write_output(public: &Path, relative: &str, content: &str) {
    let path = public.join(relative.trim_start_matches('/'));
    fs::create_dir_all(path.parent().expect("parent")).expect("create output dirs");
    fs::write(path, content).expect("write output");
}

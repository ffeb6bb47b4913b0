//! The directive API.
//!
//! `Mix` collects directives, assembles the build configuration, drives one
//! compilation through a [`CompileEngine`] and reconciles the manifest.
//!
//! ```no_run
//! use mixer_core::{BuildConfig, Mix, Stats};
//!
//! # fn main() -> mixer_core::Result<()> {
//! let mut mix = Mix::new(".");
//! mix.js(["resources/js/app.js"], "public/js")?
//!     .sass("resources/sass/app.scss", "public/css")?
//!     .version(Vec::<&str>::new())?;
//!
//! let mut engine = |_config: &BuildConfig| Ok::<_, mixer_core::Error>(Stats::default());
//! let manifest = mix.build(&mut engine)?;
//! # let _ = manifest;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use mixer_config::{ConfigDiscovery, MixConfig, MixOptions, validate_fs, validate_schema};
use serde_json::Value;

use crate::build_config::BuildConfig;
use crate::builder::ConfigBuilder;
use crate::components::{ComponentRegistry, STYLE_ONLY_ENTRY};
use crate::directive::{
    CombineSpec, CopySpec, Directive, PreprocessorKind, ScriptEntry, StylesheetEntry,
    VendorExtract,
};
use crate::engine::{CompileEngine, Stats};
use crate::events::{Event, EventBus};
use crate::hash::Versioner;
use crate::manifest::{Manifest, ManifestMap};
use crate::paths::{self, ParsedPath};
use crate::{Error, Result};

pub struct Mix {
    root: PathBuf,
    options: MixOptions,
    registry: ComponentRegistry,
    raw_override: Option<Value>,
    events: EventBus,
}

impl Mix {
    /// A project at `root` with default options.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: MixOptions::default(),
            registry: ComponentRegistry::new(),
            raw_override: None,
            events: EventBus::new(),
        }
    }

    pub fn with_options(root: impl Into<PathBuf>, options: MixOptions) -> Result<Self> {
        validate_schema(&options)?;
        let mut mix = Self::new(root);
        mix.options = options;
        Ok(mix)
    }

    pub fn from_config(root: impl Into<PathBuf>, config: MixConfig) -> Result<Self> {
        Self::with_options(root, config.options)
    }

    /// Load `mixer.toml` (or the `mixer` field of `package.json`) below `root`.
    ///
    /// Without a config file the defaults apply, still subject to `MIXER_`
    /// environment overrides.
    pub fn discover(root: impl Into<PathBuf>, profile: Option<&str>) -> Result<Self> {
        let root = root.into();
        let config = ConfigDiscovery::new(&root)
            .load_or_default()?
            .materialize_profile(profile)?;
        Self::from_config(root, config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &MixOptions {
        &self.options
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Shared handle to the lifecycle events.
    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    /// The manifest this project writes.
    pub fn manifest(&self) -> Manifest {
        Manifest::new(&self.root, &self.options)
    }

    fn record(&mut self, directive: Directive) -> Result<&mut Self> {
        self.registry.record(directive)?;
        Ok(self)
    }

    // ---- scripts ----

    /// Bundle `entries` into `output` (a file, or a directory receiving the
    /// first entry's file name).
    pub fn js<I, P>(&mut self, entries: I, output: impl Into<PathBuf>) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.script(entries, output.into(), false)
    }

    /// Like [`Mix::js`], with the React preset enabled.
    pub fn react<I, P>(&mut self, entries: I, output: impl Into<PathBuf>) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.script(entries, output.into(), true)
    }

    fn script<I, P>(&mut self, entries: I, output: PathBuf, react: bool) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.record(Directive::Js(ScriptEntry {
            entries: entries.into_iter().map(Into::into).collect(),
            output,
            react,
        }))
    }

    /// Move `libs` into a vendor bundle. `output` defaults to `vendor` next to
    /// the application scripts.
    pub fn extract<I, S>(&mut self, libs: I, output: Option<&str>) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record(Directive::Extract(VendorExtract {
            libs: libs.into_iter().map(Into::into).collect(),
            output: output.map(str::to_string),
        }))
    }

    /// Provide libraries under global identifiers, e.g. `jquery` as `$` and `jQuery`.
    pub fn autoload<I, L, A>(&mut self, libs: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (L, A)>,
        L: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let libs: IndexMap<String, Vec<String>> = libs
            .into_iter()
            .map(|(lib, aliases)| {
                let aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();
                (lib.into(), aliases)
            })
            .collect();
        self.record(Directive::Autoload(libs))
    }

    pub fn vue(&mut self, options: Value) -> Result<&mut Self> {
        self.record(Directive::Vue(options))
    }

    // ---- stylesheets ----

    pub fn sass(&mut self, src: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Result<&mut Self> {
        self.preprocess(PreprocessorKind::Sass, src, output, Value::Null)
    }

    pub fn less(&mut self, src: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Result<&mut Self> {
        self.preprocess(PreprocessorKind::Less, src, output, Value::Null)
    }

    pub fn stylus(&mut self, src: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Result<&mut Self> {
        self.preprocess(PreprocessorKind::Stylus, src, output, Value::Null)
    }

    /// Plain CSS through PostCSS with `plugins`.
    pub fn post_css(
        &mut self,
        src: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        plugins: Vec<Value>,
    ) -> Result<&mut Self> {
        self.record(Directive::Preprocess(StylesheetEntry {
            kind: PreprocessorKind::PostCss,
            src: src.into(),
            output: output.into(),
            options: Value::Null,
            plugins,
        }))
    }

    /// Compile one stylesheet; `options` go to the language's loader.
    pub fn preprocess(
        &mut self,
        kind: PreprocessorKind,
        src: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        options: Value,
    ) -> Result<&mut Self> {
        self.record(Directive::Preprocess(StylesheetEntry {
            kind,
            src: src.into(),
            output: output.into(),
            options,
            plugins: Vec::new(),
        }))
    }

    // ---- post-compile tasks ----

    pub fn combine<I, P>(&mut self, sources: I, output: impl Into<PathBuf>) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.record(Directive::Combine(CombineSpec {
            sources: sources.into_iter().map(Into::into).collect(),
            output: output.into(),
        }))
    }

    pub fn scripts<I, P>(&mut self, sources: I, output: impl Into<PathBuf>) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.combine(sources, output)
    }

    pub fn styles<I, P>(&mut self, sources: I, output: impl Into<PathBuf>) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.combine(sources, output)
    }

    /// Write `src` next to itself as `<name>.min.<ext>`.
    pub fn minify(&mut self, src: impl Into<PathBuf>) -> Result<&mut Self> {
        let src = src.into();
        let parsed = ParsedPath::parse(&src);
        let Some(ext) = parsed.ext.as_deref().filter(|_| !parsed.is_dir) else {
            return Err(Error::configuration(
                "combine",
                format!("cannot minify '{}': not a file", src.display()),
            ));
        };
        let output = parsed
            .path
            .with_file_name(format!("{}.min.{}", parsed.name, ext));
        self.combine([src], output)
    }

    /// Copy a file (or every file of a directory) into `to`.
    pub fn copy(&mut self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Result<&mut Self> {
        self.record(Directive::Copy(CopySpec {
            from: from.into(),
            to: to.into(),
            flatten: true,
        }))
    }

    /// Copy a directory, keeping its structure.
    pub fn copy_directory(
        &mut self,
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
    ) -> Result<&mut Self> {
        self.record(Directive::Copy(CopySpec {
            from: from.into(),
            to: to.into(),
            flatten: false,
        }))
    }

    /// Turn on versioning. With no files every manifest entry is versioned;
    /// listed files and directories are versioned in addition.
    pub fn version<I, P>(&mut self, files: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.options.versioning = true;
        self.record(Directive::Version(files.into_iter().map(Into::into).collect()))
    }

    // ---- options ----

    pub fn source_maps(&mut self) -> &mut Self {
        self.options.source_maps = true;
        self
    }

    pub fn set_public_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.options.public_path = PathBuf::from(ParsedPath::parse(path).without_ext());
        self
    }

    pub fn set_resource_root(&mut self, root: impl Into<String>) -> &mut Self {
        self.options.resource_root = root.into();
        self
    }

    /// Merge option overrides, e.g. `{"process_css_urls": false}`.
    pub fn merge_options(&mut self, patch: Value) -> Result<&mut Self> {
        let mut options = self.options.clone();
        options.merge(&patch)?;
        validate_schema(&options)?;
        self.options = options;
        Ok(self)
    }

    /// Raw configuration deep-merged over the assembled one. Not validated.
    pub fn webpack_config(&mut self, raw: Value) -> &mut Self {
        match &mut self.raw_override {
            Some(existing) => mixer_config::merge_values(existing, &raw),
            None => self.raw_override = Some(raw),
        }
        self
    }

    /// Live reload through Browsersync; a string is the proxied host.
    pub fn browser_sync(&mut self, config: Value) -> Result<&mut Self> {
        self.record(Directive::BrowserSync(config))
    }

    pub fn disable_notifications(&mut self) -> &mut Self {
        self.options.notifications = false;
        self
    }

    /// Run `callback` with the final manifest after every successful build.
    pub fn then<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(&ManifestMap) + Send + 'static,
    {
        self.events.listen(Event::Build, callback);
        self
    }

    // ---- building ----

    /// Assemble the configuration handed to the engine.
    pub fn build_config(&self) -> Result<BuildConfig> {
        validate_fs(&self.options, &self.root)?;
        ConfigBuilder::new(&self.options, &self.registry, &self.root)
            .with_override(self.raw_override.as_ref())
            .build()
    }

    /// Compile, run post-compile tasks, write the manifest and fire `build`.
    ///
    /// A compilation that reports errors aborts before any task runs; the
    /// previous manifest stays in place.
    pub fn build(&self, engine: &mut impl CompileEngine) -> Result<ManifestMap> {
        let config = self.build_config()?;
        let mut stats = engine.compile(&config)?;

        if stats.has_errors() {
            return Err(Error::CompileFailure {
                errors: std::mem::take(&mut stats.errors),
            });
        }
        for warning in &stats.warnings {
            tracing::warn!(%warning, "compile warning");
        }

        let mut manifest = self.manifest();
        if config.entry.contains_key(STYLE_ONLY_ENTRY) {
            self.drop_style_only_script(&manifest, &mut stats)?;
        }

        for component in self.registry.all() {
            for task in component.tasks(&self.root) {
                for written in task.run()? {
                    manifest.add(&written);
                }
            }
        }

        let public_dir = paths::resolve(&self.root, &self.options.public_path);
        let targets: Vec<PathBuf> = self
            .registry
            .all()
            .flat_map(|component| component.versioned_targets().iter().cloned())
            .collect();
        let versioned =
            Versioner::new(&self.root, &public_dir).resolve_set(self.options.versioning, &targets)?;
        manifest.set_versioned(versioned);

        let map = manifest.transform(&stats)?;
        self.events.fire(Event::Build, &map);
        tracing::info!(assets = map.len(), "build complete");
        Ok(map)
    }

    /// Stylesheets compiled without any script bundle still produce an empty
    /// script for their group; it is deleted and kept out of the manifest.
    fn drop_style_only_script(&self, manifest: &Manifest, stats: &mut Stats) -> Result<()> {
        let script_key = format!("/{}.js", STYLE_ONLY_ENTRY);
        stats.assets_by_chunk_name.retain(|_, assets| {
            !assets.retain(|path| manifest.normalize(path) != script_key)
        });

        let public_dir = paths::resolve(&self.root, &self.options.public_path);
        let script = paths::physical_from_logical(&public_dir, &script_key);
        match std::fs::remove_file(&script) {
            Ok(()) => {
                tracing::debug!(path = %script.display(), "removed style-only script");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(
                format!("Failed to remove '{}'", script.display()),
                e,
            )),
        }
    }
}

impl std::fmt::Debug for Mix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mix")
            .field("root", &self.root)
            .field("options", &self.options)
            .field("components", &self.registry)
            .finish()
    }
}

//! Assembles the final build configuration from registered components.
//!
//! Order of operations:
//!
//! 1. dependency check across the registry
//! 2. base configuration (output skeleton, base rules and plugins)
//! 3. phase 1: every component's `contribute`, in registration order
//! 4. phase 2: every component's `extend`, in registration order
//! 5. one-rule-per-extension validation
//! 6. the raw user override, deep-merged last and not validated

use std::path::Path;

use mixer_config::MixOptions;
use serde_json::{Value, json};

use crate::build_config::{
    BuildConfig, Loader, LoaderChain, ModuleRule, PluginSpec, RuleTest, STYLE_LOADER,
};
use crate::components::ComponentRegistry;
use crate::paths::{self, to_logical, to_url_path};
use crate::{Error, Result};

/// Dependency directories babel never transpiles.
const VENDOR_DIRS: &str = "node_modules|bower_components";

/// State threaded through every contribution.
pub struct BuildContext<'a> {
    pub options: &'a MixOptions,
    pub registry: &'a ComponentRegistry,
    /// Project root
    pub root: &'a Path,
    pub config: BuildConfig,
}

impl BuildContext<'_> {
    /// Path relative to the public directory, without a leading slash.
    ///
    /// `public/css/app.css` becomes `css/app.css`.
    pub fn public_relative(&self, path: &str) -> String {
        let public_dir = to_url_path(&self.config.output.path.to_string_lossy());
        let public = self.options.public_path_str();
        to_logical(path, &[public_dir.as_str(), public.as_str()])
            .trim_start_matches('/')
            .to_string()
    }

    /// [`BuildConfig::extend_rule`], failing with a configuration error
    /// attributed to `component` when there is nothing to extend.
    pub fn extend_rule_or_fail<F>(
        &mut self,
        component: &str,
        ext: &str,
        fallback: Option<ModuleRule>,
        f: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut LoaderChain),
    {
        if self.config.extend_rule(ext, fallback, f) {
            Ok(())
        } else {
            Err(Error::configuration(
                component,
                format!("no rule handles '.{}' files and there is no default to add", ext),
            ))
        }
    }

    pub fn css_loaders(&self) -> Vec<Loader> {
        css_loaders(self.options)
    }
}

/// `css-loader` and `postcss-loader` shared by every stylesheet rule.
pub fn css_loaders(options: &MixOptions) -> Vec<Loader> {
    let source_map = options.wants_source_maps();
    vec![
        Loader::new("css-loader").with_options(json!({
            "url": options.process_css_urls,
            "sourceMap": source_map,
        })),
        Loader::new("postcss-loader").with_options(json!({ "sourceMap": source_map })),
    ]
}

/// Builds a [`BuildConfig`] from a registry.
pub struct ConfigBuilder<'a> {
    options: &'a MixOptions,
    registry: &'a ComponentRegistry,
    root: &'a Path,
    raw_override: Option<&'a Value>,
}

impl<'a> ConfigBuilder<'a> {
    pub fn new(options: &'a MixOptions, registry: &'a ComponentRegistry, root: &'a Path) -> Self {
        Self {
            options,
            registry,
            root,
            raw_override: None,
        }
    }

    /// Raw configuration deep-merged over the result.
    pub fn with_override(mut self, raw: Option<&'a Value>) -> Self {
        self.raw_override = raw;
        self
    }

    pub fn build(self) -> Result<BuildConfig> {
        self.registry.check_dependencies()?;

        let mut ctx = BuildContext {
            options: self.options,
            registry: self.registry,
            root: self.root,
            config: base_config(self.options, self.root),
        };

        for component in self.registry.all() {
            tracing::debug!(component = component.name(), "contributing");
            component.contribute(&mut ctx)?;
        }

        for component in self.registry.all() {
            component.extend(&mut ctx)?;
        }

        let duplicates = ctx.config.duplicate_extensions();
        if !duplicates.is_empty() {
            return Err(Error::configuration(
                "builder",
                format!(
                    "more than one rule handles: {}",
                    duplicates
                        .iter()
                        .map(|ext| format!(".{}", ext))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ));
        }

        let mut config = ctx.config;
        if let Some(raw) = self.raw_override {
            config.apply_override(raw).map_err(|e| {
                Error::configuration("webpack_config", format!("invalid override: {}", e))
            })?;
        }

        tracing::debug!(
            entries = config.entry.len(),
            rules = config.module.rules.len(),
            plugins = config.plugins.len(),
            "build configuration assembled"
        );
        Ok(config)
    }
}

/// Configuration every build starts from.
pub fn base_config(options: &MixOptions, root: &Path) -> BuildConfig {
    let mut config = BuildConfig {
        context: root.to_path_buf(),
        ..BuildConfig::default()
    };

    config.output.path = paths::resolve(root, &options.public_path);
    config.output.public_path = if options.resource_root.is_empty() {
        "/".to_string()
    } else {
        options.resource_root.clone()
    };

    config.add_rule(
        ModuleRule::new(
            RuleTest::extensions(["js", "jsx"]),
            LoaderChain::Loaders(vec![
                Loader::new("babel-loader").with_options(json!({ "presets": [["env", { "modules": false }]] })),
            ]),
        )
        .exclude(format!("({})", VENDOR_DIRS)),
    );

    let mut css = vec![Loader::new(STYLE_LOADER)];
    css.extend(css_loaders(options));
    config.add_rule(ModuleRule::new(
        RuleTest::extensions(["css"]),
        LoaderChain::Loaders(css),
    ));

    config.add_rule(ModuleRule::new(
        RuleTest::extensions(["png", "jpg", "jpeg", "gif"]),
        LoaderChain::Loaders(vec![Loader::new("file-loader").with_options(json!({
            "name": "images/[name].[ext]",
            "publicPath": options.resource_root,
        }))]),
    ));

    config.add_rule(ModuleRule::new(
        RuleTest::extensions(["woff", "woff2", "ttf", "eot", "svg", "otf"]),
        LoaderChain::Loaders(vec![Loader::new("file-loader").with_options(json!({
            "name": "fonts/[name].[ext]",
            "publicPath": options.resource_root,
        }))]),
    ));

    let node_env = if options.production { "production" } else { "development" };
    config.add_plugin_once(PluginSpec::new(
        "define",
        json!({ "process.env": { "NODE_ENV": format!("\"{}\"", node_env) } }),
    ));
    if options.notifications {
        config.add_plugin_once(PluginSpec::new(
            "notifications",
            json!({ "title": "Mixer", "alwaysNotify": true }),
        ));
    }

    config.resolve.extensions = ["*", ".js", ".jsx", ".vue"].map(String::from).to_vec();
    if options.wants_source_maps() {
        config.devtool = Some("inline-source-map".to_string());
    }

    config
}

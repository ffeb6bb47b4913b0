//! The engine's input schema.
//!
//! `BuildConfig` is what components contribute into and what the compile
//! engine consumes. Rule bookkeeping keeps the merged rule set honest: at most
//! one rule claims any given file extension.

mod rule;

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use rule::{ExtractChain, ExtractTarget, Loader, LoaderChain, ModuleRule, RuleTest};
pub(crate) use rule::STYLE_LOADER;

/// Full build configuration handed to the compile engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Project root all entries resolve against
    pub context: PathBuf,
    /// Bundle group name -> source files, in declaration order
    pub entry: IndexMap<String, Vec<String>>,
    pub output: OutputDescriptor,
    pub module: ModuleConfig,
    pub plugins: Vec<PluginSpec>,
    /// Module request -> global variable provided at runtime
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub externals: IndexMap<String, String>,
    pub resolve: ResolveConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devtool: Option<String>,
    /// Engine keys with no typed field (`target`, `node`, `stats`, ...),
    /// usually set through the raw override
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDescriptor {
    pub path: PathBuf,
    pub filename: String,
    pub chunk_filename: String,
    pub public_path: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for OutputDescriptor {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            filename: "[name].js".to_string(),
            chunk_filename: "[name].js".to_string(),
            public_path: "/".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub rules: Vec<ModuleRule>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A plugin instance: engine-side name plus its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

impl PluginSpec {
    pub fn new(name: impl Into<String>, options: Value) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveConfig {
    pub extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub alias: IndexMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BuildConfig {
    /// Add sources to a bundle group, creating the group on first use.
    pub fn add_entry<I, S>(&mut self, name: &str, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = self.entry.entry(name.to_string()).or_default();
        for source in sources {
            let source = source.into();
            if !group.contains(&source) {
                group.push(source);
            }
        }
    }

    /// Append a rule, shadowing earlier rules for the extensions it claims.
    ///
    /// Earlier rules lose the overlapping extensions and are dropped once
    /// they claim none.
    pub fn add_rule(&mut self, rule: ModuleRule) {
        for existing in &mut self.module.rules {
            if existing.test.release(&rule.test) {
                tracing::debug!(
                    shadowed = %existing.test.pattern(),
                    by = %rule.test.pattern(),
                    "rule shadowed"
                );
            }
        }
        self.module.rules.retain(|existing| !existing.test.is_empty());
        self.module.rules.push(rule);
    }

    /// The rule currently claiming `ext`.
    pub fn rule_for(&self, ext: &str) -> Option<&ModuleRule> {
        self.module
            .rules
            .iter()
            .rev()
            .find(|rule| rule.test.matches_extension(ext))
    }

    /// Rewrite the loader chain of the rule claiming `ext`.
    ///
    /// Only the loaders are handed to `f`; the rule's test never changes. When
    /// no rule claims `ext`, `fallback` is inserted first. Returns `false` when
    /// there is neither a rule nor a fallback.
    pub fn extend_rule<F>(&mut self, ext: &str, fallback: Option<ModuleRule>, f: F) -> bool
    where
        F: FnOnce(&mut LoaderChain),
    {
        let index = self
            .module
            .rules
            .iter()
            .rposition(|rule| rule.test.matches_extension(ext));

        let index = match (index, fallback) {
            (Some(index), _) => index,
            (None, Some(rule)) => {
                self.add_rule(rule);
                self.module.rules.len() - 1
            }
            (None, None) => return false,
        };

        f(&mut self.module.rules[index].loaders);
        true
    }

    /// Append a plugin unless one with the same name is already present.
    pub fn add_plugin_once(&mut self, plugin: PluginSpec) -> bool {
        if self.plugin(&plugin.name).is_some() {
            return false;
        }
        self.plugins.push(plugin);
        true
    }

    /// Replace the plugin with the same name, or append it.
    pub fn upsert_plugin(&mut self, plugin: PluginSpec) {
        match self.plugins.iter_mut().find(|p| p.name == plugin.name) {
            Some(existing) => *existing = plugin,
            None => self.plugins.push(plugin),
        }
    }

    pub fn plugin(&self, name: &str) -> Option<&PluginSpec> {
        self.plugins.iter().find(|p| p.name == name)
    }

    /// Extensions claimed by more than one rule.
    pub fn duplicate_extensions(&self) -> Vec<String> {
        let mut seen: IndexMap<&str, usize> = IndexMap::new();
        for rule in &self.module.rules {
            for ext in rule.test.exts() {
                *seen.entry(ext.as_str()).or_default() += 1;
            }
        }
        seen.into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(ext, _)| ext.to_string())
            .collect()
    }

    /// Deep-merge a raw JSON override over this configuration.
    ///
    /// Objects merge recursively; arrays and scalars in `raw` replace. Keys
    /// without a typed field land in the `extra` maps and reach the engine
    /// as written. A value of the wrong shape for a typed field is an error.
    pub fn apply_override(&mut self, raw: &Value) -> Result<(), serde_json::Error> {
        let mut value = serde_json::to_value(&*self)?;
        mixer_config::merge_values(&mut value, raw);
        *self = serde_json::from_value(value)?;
        Ok(())
    }
}

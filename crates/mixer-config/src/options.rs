//! Build options shared by every component.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::merge_values;
use crate::error::{ConfigError, Result};
use crate::helpers::{
    default_hash_length, default_manifest_name, default_public_path, default_true,
    default_vue_styles_file,
};

/// Options that shape how directives are turned into a build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixOptions {
    /// Directory compiled assets are served from; also holds the manifest
    #[serde(default = "default_public_path")]
    pub public_path: PathBuf,

    /// Prefix applied to rewritten `url()` references in stylesheets
    #[serde(default)]
    pub resource_root: String,

    /// File name of the manifest inside `public_path`
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,

    /// Production build (disables inline source maps)
    #[serde(default)]
    pub production: bool,

    /// Emit source maps
    #[serde(default)]
    pub source_maps: bool,

    /// Let css-loader rewrite `url()` references
    #[serde(default = "default_true")]
    pub process_css_urls: bool,

    /// Append content-hash tokens to manifest values
    #[serde(default)]
    pub versioning: bool,

    /// Extract styles from Vue components into a stylesheet
    #[serde(default)]
    pub extract_vue_styles: ExtractVueStyles,

    /// Stylesheet injected into every Vue component's Sass block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_vue_styles: Option<PathBuf>,

    /// Desktop notifications after each build
    #[serde(default = "default_true")]
    pub notifications: bool,

    /// Length of the hex token appended as `?id=`
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,
}

impl Default for MixOptions {
    fn default() -> Self {
        Self {
            public_path: default_public_path(),
            resource_root: String::new(),
            manifest_name: default_manifest_name(),
            production: false,
            source_maps: false,
            process_css_urls: true,
            versioning: false,
            extract_vue_styles: ExtractVueStyles::default(),
            global_vue_styles: None,
            notifications: true,
            hash_length: default_hash_length(),
        }
    }
}

impl MixOptions {
    /// Create from serde_json::Value
    ///
    /// # Example
    ///
    /// ```
    /// use mixer_config::MixOptions;
    /// use serde_json::json;
    ///
    /// let options = MixOptions::from_value(json!({ "public_path": "web" })).unwrap();
    /// assert_eq!(options.public_path_str(), "web");
    /// ```
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::invalid("options", e.to_string()))
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::invalid("options", e.to_string()))
    }

    /// Deep-merge a partial set of options over the current ones.
    ///
    /// Unknown keys are rejected by the round-trip through `MixOptions`.
    pub fn merge(&mut self, patch: &Value) -> Result<()> {
        let mut base = self.to_value()?;
        merge_values(&mut base, patch);
        *self = Self::from_value(base)?;
        Ok(())
    }

    /// Public path as a URL-style prefix: forward slashes, no `./`, no trailing `/`.
    pub fn public_path_str(&self) -> String {
        normalize_prefix(&self.public_path)
    }

    /// Absolute location of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.public_path.join(&self.manifest_name)
    }

    /// Whether inline source maps should be emitted for this build.
    pub fn wants_source_maps(&self) -> bool {
        self.source_maps && !self.production
    }
}

fn normalize_prefix(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let trimmed = raw.trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Vue style extraction: off, into the last stylesheet output, or into a named file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractVueStyles {
    Toggle(bool),
    File(String),
}

impl Default for ExtractVueStyles {
    fn default() -> Self {
        ExtractVueStyles::Toggle(false)
    }
}

impl ExtractVueStyles {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ExtractVueStyles::Toggle(false))
    }

    /// Explicit target file, when one was given.
    pub fn file(&self) -> Option<&str> {
        match self {
            ExtractVueStyles::File(file) => Some(file.as_str()),
            ExtractVueStyles::Toggle(_) => None,
        }
    }

    /// Target used when no stylesheet output can absorb the Vue styles.
    pub fn fallback_file(&self) -> String {
        self.file()
            .map(str::to_string)
            .unwrap_or_else(default_vue_styles_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overrides_only_given_fields() {
        let mut options = MixOptions::default();
        options
            .merge(&json!({ "process_css_urls": false, "resource_root": "/cdn" }))
            .unwrap();

        assert!(!options.process_css_urls);
        assert_eq!(options.resource_root, "/cdn");
        assert_eq!(options.manifest_name, "mix-manifest.json");
    }

    #[test]
    fn extract_vue_styles_accepts_bool_or_path() {
        let on = MixOptions::from_value(json!({ "extract_vue_styles": true })).unwrap();
        assert!(on.extract_vue_styles.is_enabled());
        assert_eq!(on.extract_vue_styles.file(), None);

        let file =
            MixOptions::from_value(json!({ "extract_vue_styles": "/css/components.css" })).unwrap();
        assert_eq!(file.extract_vue_styles.file(), Some("/css/components.css"));
        assert_eq!(file.extract_vue_styles.fallback_file(), "/css/components.css");

        assert!(!MixOptions::default().extract_vue_styles.is_enabled());
    }

    #[test]
    fn public_path_is_normalized() {
        let mut options = MixOptions::default();
        options.public_path = PathBuf::from("./test\\fake-app\\public/");
        assert_eq!(options.public_path_str(), "test/fake-app/public");
    }

    #[test]
    fn source_maps_are_disabled_in_production() {
        let mut options = MixOptions::default();
        options.source_maps = true;
        assert!(options.wants_source_maps());
        options.production = true;
        assert!(!options.wants_source_maps());
    }
}

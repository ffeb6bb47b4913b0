//! File-based config discovery
//!
//! Handles finding and loading mixer configuration files from the filesystem.
//! Environment variables prefixed with `MIXER_` override file values
//! (`MIXER_OPTIONS__PUBLIC_PATH=web` sets `options.public_path`).

use std::fs;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde_json::Value;

use crate::config::MixConfig;
use crate::error::{ConfigError, Result};

const CONFIG_FILE: &str = "mixer.toml";
const PACKAGE_FIELD: &str = "mixer";
const ENV_PREFIX: &str = "MIXER_";

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use mixer_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// let config = discovery.load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    /// Create a new config discovery with a root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. TOML config: mixer.toml
    /// 2. package.json (mixer field)
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join(CONFIG_FILE);
        if toml_path.exists() {
            return Some(toml_path);
        }

        let pkg_path = self.root.join("package.json");
        if pkg_path.exists() {
            if let Ok(content) = fs::read_to_string(&pkg_path) {
                if let Ok(parsed) = serde_json::from_str::<Value>(&content) {
                    if parsed.get(PACKAGE_FIELD).is_some_and(|v| !v.is_null()) {
                        return Some(pkg_path);
                    }
                }
            }
        }

        None
    }

    /// Load config from discovered file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no config file is found.
    pub fn load(&self) -> Result<MixConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        self.load_from(&path)
    }

    /// Load config, falling back to defaults (plus environment) when no file exists
    pub fn load_or_default(&self) -> Result<MixConfig> {
        match self.find() {
            Some(path) => self.load_from(&path),
            None => extract(Figment::from(Serialized::defaults(MixConfig::default()))),
        }
    }

    /// Load config with profile merging
    pub fn load_with_profile(&self, profile: &str) -> Result<MixConfig> {
        self.load()?.materialize_profile(Some(profile))
    }

    fn load_from(&self, path: &Path) -> Result<MixConfig> {
        tracing::debug!(path = %path.display(), "loading mixer config");

        if path.file_name() == Some(std::ffi::OsStr::new("package.json")) {
            return self.load_from_package_json(path);
        }

        extract(Figment::from(Toml::file(path)))
    }

    fn load_from_package_json(&self, path: &Path) -> Result<MixConfig> {
        let content = fs::read_to_string(path)?;

        let parsed: Value = serde_json::from_str(&content)
            .map_err(|e| ConfigError::invalid("package.json", format!("Invalid JSON: {}", e)))?;

        let value = parsed
            .get(PACKAGE_FIELD)
            .filter(|v| !v.is_null())
            .ok_or_else(|| {
                ConfigError::invalid(PACKAGE_FIELD, "Add a 'mixer' field to your package.json")
            })?;

        extract(Figment::from(Serialized::defaults(value.clone())))
    }
}

fn extract(figment: Figment) -> Result<MixConfig> {
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::invalid("config", e.to_string()))
}

/// Discover and load config from current directory (convenience function)
pub fn discover() -> Result<MixConfig> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(&root).load()
}

/// Discover and load config with profile (convenience function)
pub fn discover_with_profile(profile: &str) -> Result<MixConfig> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(&root).load_with_profile(profile)
}

//! High-level configuration structure for mixer.
//!
//! This module provides the main `MixConfig` struct and profile merging logic.
//! For file discovery, see the `discovery` module.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result as ConfigResult};
use crate::options::MixOptions;
use crate::settings::GlobalSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MixConfig {
    #[serde(default)]
    pub options: MixOptions,

    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,

    #[serde(default)]
    pub settings: GlobalSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub options: Value,

    #[serde(default)]
    pub settings: Value,
}

impl MixConfig {
    /// Create from serde_json::Value (for programmatic config)
    ///
    /// # Example
    ///
    /// ```
    /// use mixer_config::MixConfig;
    /// use serde_json::json;
    /// use std::path::PathBuf;
    ///
    /// let value = json!({
    ///     "options": {
    ///         "public_path": "web",
    ///         "source_maps": true
    ///     }
    /// });
    ///
    /// let config = MixConfig::from_value(value).unwrap();
    /// assert_eq!(config.options.public_path, PathBuf::from("web"));
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::invalid("config", e.to_string()))
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::invalid("config", e.to_string()))
    }

    /// Fold the named profile's overrides into the base options and settings.
    ///
    /// An unknown profile name leaves the config untouched.
    pub fn materialize_profile(mut self, profile: Option<&str>) -> ConfigResult<Self> {
        let Some(name) = profile else {
            return Ok(self);
        };
        let Some(profile_cfg) = self.profiles.get(name) else {
            tracing::debug!(profile = name, "profile not declared, using base options");
            return Ok(self);
        };

        if !profile_cfg.options.is_null() {
            self.options = merge_section(&self.options, &profile_cfg.options)?;
        }

        if !profile_cfg.settings.is_null() {
            self.settings = merge_section(&self.settings, &profile_cfg.settings)?;
        }

        Ok(self)
    }
}

fn merge_section<T>(base: &T, overrides: &Value) -> ConfigResult<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let mut value = serde_json::to_value(base).map_err(|err| {
        ConfigError::InvalidProfileOverride {
            message: err.to_string(),
        }
    })?;
    merge_values(&mut value, overrides);
    serde_json::from_value(value).map_err(|err| ConfigError::InvalidProfileOverride {
        message: err.to_string(),
    })
}

/// Deep-merge `update` into `target`.
///
/// Objects merge key by key; arrays and scalars in `update` replace the target value.
pub fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, Value::Object(update_map)) => {
            let mut new_obj = serde_json::Map::with_capacity(update_map.len());
            for (key, value) in update_map {
                new_obj.insert(key.clone(), value.clone());
            }
            *target_slot = Value::Object(new_obj);
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn from_value_creates_config() {
        let value = json!({
            "options": {
                "public_path": "web",
                "versioning": true
            }
        });

        let config = MixConfig::from_value(value).unwrap();
        assert_eq!(config.options.public_path, PathBuf::from("web"));
        assert!(config.options.versioning);
    }

    #[test]
    fn to_value_serializes_config() {
        let mut config = MixConfig::default();
        config.options.production = true;

        let value = config.to_value().unwrap();
        assert_eq!(value["options"]["production"], json!(true));
    }

    #[test]
    fn profile_merging_works() {
        let value = json!({
            "options": {
                "source_maps": true,
                "production": false
            },
            "profiles": {
                "production": {
                    "options": {
                        "production": true,
                        "versioning": true
                    }
                }
            }
        });

        let config = MixConfig::from_value(value)
            .unwrap()
            .materialize_profile(Some("production"))
            .unwrap();

        assert!(config.options.production);
        assert!(config.options.versioning);
        assert!(config.options.source_maps);
    }

    #[test]
    fn unknown_profile_is_ignored() {
        let config = MixConfig::default()
            .materialize_profile(Some("staging"))
            .unwrap();
        assert_eq!(config.options, MixOptions::default());
    }

    #[test]
    fn merge_values_replaces_arrays_and_merges_objects() {
        let mut target = json!({ "a": { "x": 1, "y": 2 }, "list": [1, 2, 3] });
        merge_values(&mut target, &json!({ "a": { "y": 5 }, "list": [9] }));
        assert_eq!(target, json!({ "a": { "x": 1, "y": 5 }, "list": [9] }));
    }
}

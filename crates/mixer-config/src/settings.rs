//! Global settings shared across profiles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Log level forwarded to the logging subscriber (`info`, `debug`, ...)
    #[serde(default)]
    pub log_level: Option<String>,

    /// Most verbose logging, overriding `log_level`
    #[serde(default)]
    pub trace: bool,
}

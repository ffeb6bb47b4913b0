//! # mixer-config
//!
//! Options that drive a mixer build, plus discovery of `mixer.toml` /
//! `package.json` configuration with profile overrides.

pub mod config;
pub mod discovery;
pub mod error;
mod helpers;
pub mod options;
pub mod settings;
pub mod validation;

// Re-export main types
pub use config::*;
pub use error::*;
pub use options::*;
pub use settings::*;

// Re-export discovery and validation
pub use discovery::{ConfigDiscovery, discover, discover_with_profile};
pub use validation::{
    ConfigValidator, FsValidator, HASH_LENGTH_RANGE, SchemaValidator, validate_fs, validate_schema,
};

//! Pluggable option validation strategies
//!
//! Separates filesystem validation from schema validation.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::options::MixOptions;

/// Accepted range for the `?id=` token length (hex characters).
pub const HASH_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 8..=64;

/// Trait for pluggable option validation strategies
pub trait ConfigValidator {
    fn validate(&self, options: &MixOptions) -> Result<()>;
}

/// Schema-only validation (no filesystem checks)
///
/// # Example
///
/// ```
/// use mixer_config::{MixOptions, SchemaValidator, ConfigValidator};
///
/// SchemaValidator.validate(&MixOptions::default()).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, options: &MixOptions) -> Result<()> {
        if options.public_path.as_os_str().is_empty() {
            return Err(ConfigError::SchemaValidation {
                message: "public_path cannot be empty".to_string(),
                hint: Some("Use \".\" to serve from the project root".to_string()),
            });
        }

        if options.manifest_name.trim().is_empty() || options.manifest_name.contains('/') {
            return Err(ConfigError::SchemaValidation {
                message: format!("invalid manifest_name '{}'", options.manifest_name),
                hint: Some("Use a bare file name such as mix-manifest.json".to_string()),
            });
        }

        if !HASH_LENGTH_RANGE.contains(&options.hash_length) {
            return Err(ConfigError::SchemaValidation {
                message: format!(
                    "hash_length {} is out of range ({} to {})",
                    options.hash_length,
                    HASH_LENGTH_RANGE.start(),
                    HASH_LENGTH_RANGE.end()
                ),
                hint: None,
            });
        }

        if let Some(file) = options.extract_vue_styles.file() {
            if !file.ends_with(".css") {
                return Err(ConfigError::SchemaValidation {
                    message: format!("extract_vue_styles target '{}' is not a .css file", file),
                    hint: Some("Pass true or a path such as /css/vue-styles.css".to_string()),
                });
            }
        }

        Ok(())
    }
}

/// Filesystem validator
///
/// Runs schema validation, then checks that referenced files exist under `root`.
pub struct FsValidator {
    root: PathBuf,
}

impl FsValidator {
    /// Create a new filesystem validator with a root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ConfigValidator for FsValidator {
    fn validate(&self, options: &MixOptions) -> Result<()> {
        SchemaValidator.validate(options)?;

        if let Some(styles) = &options.global_vue_styles {
            let path = self.root.join(styles);
            if !path.is_file() {
                return Err(ConfigError::GlobalStylesNotFound { path });
            }
        }

        Ok(())
    }
}

/// Convenience function for schema-only validation
pub fn validate_schema(options: &MixOptions) -> Result<()> {
    SchemaValidator.validate(options)
}

/// Convenience function for filesystem validation
pub fn validate_fs(options: &MixOptions, root: impl AsRef<Path>) -> Result<()> {
    FsValidator::new(root).validate(options)
}

use std::path::PathBuf;

/// Error types for mixer-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A component could not assemble valid configuration.
    #[error("Configuration error in '{component}': {message}")]
    Configuration { component: String, message: String },

    /// The persisted manifest exists but is not valid JSON.
    #[error("Failed to parse manifest at {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The compile engine reported build errors.
    #[error("Compilation failed: {}", format_compile_errors(.errors))]
    CompileFailure { errors: Vec<String> },

    /// I/O error with context message.
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Options could not be loaded or validated.
    #[error("Invalid options: {0}")]
    Config(#[from] mixer_config::ConfigError),
}

/// Result type alias for mixer-core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source,
        }
    }
}

fn format_compile_errors(errors: &[String]) -> String {
    match errors {
        [] => "Unknown compile error".to_string(),
        [single] => single.clone(),
        many => format!("{} errors: {}", many.len(), many.join("; ")),
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Configuration { .. } => "CONFIGURATION_ERROR",
            Error::ManifestParse { .. } => "MANIFEST_PARSE_ERROR",
            Error::CompileFailure { .. } => "COMPILE_FAILURE",
            Error::Io { .. } => "IO_ERROR",
            Error::Config(_) => "INVALID_OPTIONS",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Configuration { component, .. } => Some(Box::new(format!(
                "Check the arguments passed to the '{}' directive. The build was aborted before compiling.",
                component
            ))),
            Error::ManifestParse { path, .. } => Some(Box::new(format!(
                "The manifest '{}' is corrupted. Delete it and rebuild to regenerate it.",
                path.display()
            ))),
            Error::CompileFailure { errors } if errors.len() > 1 => Some(Box::new(
                "Multiple compile errors occurred. The manifest was left untouched.".to_string(),
            )),
            Error::CompileFailure { .. } => Some(Box::new(
                "The manifest was left untouched.".to_string(),
            )),
            _ => None,
        }
    }
}

//! Components: the units directives accumulate into.
//!
//! Every component contributes to the build configuration in two phases.
//! `contribute` appends rules, plugins and entries in registration order;
//! `extend` runs once all contributions are in and may rewrite another
//! component's rule through [`BuildConfig::extend_rule`].
//!
//! Components that other components need to find expose a capability
//! ([`ExtractionSink`], [`PostCssProvider`], [`ScriptBundle`]) instead of being
//! looked up by name.
//!
//! [`BuildConfig::extend_rule`]: crate::build_config::BuildConfig::extend_rule

mod autoload;
mod browser_sync;
mod combine;
mod copy;
mod extract;
mod js;
mod preprocessor;
pub mod registry;
mod version;
mod vue;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::builder::BuildContext;
use crate::directive::Directive;
use crate::tasks::Task;
use crate::{Error, Result};

pub use autoload::AutoloadComponent;
pub use browser_sync::BrowserSyncComponent;
pub use combine::CombineComponent;
pub use copy::CopyComponent;
pub use extract::VendorComponent;
pub use js::ScriptComponent;
pub use preprocessor::PreprocessorComponent;
pub(crate) use preprocessor::STYLE_ONLY_ENTRY;
pub use registry::ComponentRegistry;
pub use version::VersionComponent;
pub use vue::VueComponent;

/// A named unit of directive state that contributes build configuration.
pub trait Component: Send {
    /// Unique name; directives with this name accumulate here.
    fn name(&self) -> &'static str;

    /// Components that must be registered for this one to build.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Fold a directive into this component's state.
    fn register(&mut self, directive: Directive) -> Result<()>;

    /// Phase 1: append rules, plugins and entries.
    fn contribute(&self, ctx: &mut BuildContext<'_>) -> Result<()>;

    /// Phase 2: rewrite rules contributed by others.
    fn extend(&self, _ctx: &mut BuildContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Post-compile work, run in registration order.
    fn tasks(&self, _root: &Path) -> Vec<Task> {
        Vec::new()
    }

    /// Files and directories explicitly opted into versioning.
    fn versioned_targets(&self) -> &[PathBuf] {
        &[]
    }

    fn as_extraction_sink(&self) -> Option<&dyn ExtractionSink> {
        None
    }

    fn as_postcss_provider(&self) -> Option<&dyn PostCssProvider> {
        None
    }

    fn as_script_bundle(&self) -> Option<&dyn ScriptBundle> {
        None
    }
}

/// Owns at least one extracted stylesheet.
pub trait ExtractionSink {
    /// Most recently declared stylesheet output, project-relative.
    fn last_extraction_file(&self) -> Option<String>;
}

/// Supplies the PostCSS plugin list for other stylesheet rules.
pub trait PostCssProvider {
    fn postcss_plugins(&self) -> Vec<Value>;
}

/// Owns JavaScript bundle groups.
///
/// Paths are project-relative as declared; map them with
/// [`BuildContext::public_relative`].
pub trait ScriptBundle {
    /// Output directory of the most recent bundle.
    fn bundle_base(&self) -> Option<String>;

    /// Output of the first bundle without extension; stylesheets ride along with it.
    fn primary_entry(&self) -> Option<String>;
}

/// Create the empty component a directive kind accumulates into.
pub(crate) fn create(directive: &Directive) -> Box<dyn Component> {
    match directive {
        Directive::Js(_) => Box::new(ScriptComponent::default()),
        Directive::Preprocess(entry) => Box::new(PreprocessorComponent::new(entry.kind)),
        Directive::Vue(_) => Box::new(VueComponent::default()),
        Directive::Extract(_) => Box::new(VendorComponent::default()),
        Directive::Autoload(_) => Box::new(AutoloadComponent::default()),
        Directive::BrowserSync(_) => Box::new(BrowserSyncComponent::default()),
        Directive::Copy(_) => Box::new(CopyComponent::default()),
        Directive::Combine(_) => Box::new(CombineComponent::default()),
        Directive::Version(_) => Box::new(VersionComponent::default()),
    }
}

/// Error for a directive routed to the wrong component.
pub(crate) fn unexpected(component: &str, directive: &Directive) -> Error {
    Error::configuration(
        component,
        format!("cannot accept a '{}' directive", directive.component()),
    )
}

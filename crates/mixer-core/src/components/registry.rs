//! Component registry in registration order.
//!
//! The registry owns every component for the lifetime of a build. Iteration
//! order is the order in which each component's first directive arrived; this
//! order decides which rule wins when two components claim the same extension.

use indexmap::IndexMap;

use super::{Component, ExtractionSink, PostCssProvider, ScriptBundle, create};
use crate::directive::Directive;
use crate::{Error, Result};

/// Components keyed by name, in registration order.
#[derive(Default)]
pub struct ComponentRegistry {
    components: IndexMap<&'static str, Box<dyn Component>>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under its name.
    ///
    /// Fails when a component with the same name is already registered; use
    /// [`ComponentRegistry::replace`] to swap one out.
    pub fn register(&mut self, component: Box<dyn Component>) -> Result<()> {
        let name = component.name();
        if self.components.contains_key(name) {
            return Err(Error::configuration(
                name,
                "a component with this name is already registered",
            ));
        }
        self.components.insert(name, component);
        Ok(())
    }

    /// Replace a registered component, keeping its position. Returns the old one.
    pub fn replace(&mut self, component: Box<dyn Component>) -> Option<Box<dyn Component>> {
        self.components.insert(component.name(), component)
    }

    /// The component a directive accumulates into, created on first use.
    pub fn entry_or_insert(&mut self, directive: &Directive) -> &mut Box<dyn Component> {
        self.components
            .entry(directive.component())
            .or_insert_with(|| {
                tracing::debug!(component = directive.component(), "registering component");
                create(directive)
            })
    }

    /// Fold a directive into its component.
    ///
    /// A component created for a rejected directive is not kept.
    pub fn record(&mut self, directive: Directive) -> Result<()> {
        let name = directive.component();
        let created = !self.components.contains_key(name);
        let result = self.entry_or_insert(&directive).register(directive);
        if result.is_err() && created {
            self.components.shift_remove(name);
        }
        result
    }

    pub fn get(&self, name: &str) -> Option<&dyn Component> {
        self.components.get(name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// All components, in registration order.
    pub fn all(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.values().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Most recently registered extraction sink.
    pub fn last_with_extraction_sink(&self) -> Option<&dyn ExtractionSink> {
        self.all().filter_map(|c| c.as_extraction_sink()).last()
    }

    /// Most recently registered PostCSS plugin provider.
    pub fn last_with_postcss_provider(&self) -> Option<&dyn PostCssProvider> {
        self.all().filter_map(|c| c.as_postcss_provider()).last()
    }

    pub fn script_bundle(&self) -> Option<&dyn ScriptBundle> {
        self.all().find_map(|c| c.as_script_bundle())
    }

    /// Check every component's dependencies are registered.
    pub fn check_dependencies(&self) -> Result<()> {
        for component in self.all() {
            for dependency in component.dependencies() {
                if !self.contains(dependency) {
                    return Err(Error::configuration(
                        component.name(),
                        format!("requires the '{}' component to be registered", dependency),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.components.keys()).finish()
    }
}

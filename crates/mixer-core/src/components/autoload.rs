use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{Component, unexpected};
use crate::build_config::PluginSpec;
use crate::builder::BuildContext;
use crate::directive::Directive;
use crate::Result;

/// Identifiers resolved to a library whenever scripts reference them.
#[derive(Debug, Default)]
pub struct AutoloadComponent {
    /// identifier -> library
    aliases: IndexMap<String, String>,
}

impl Component for AutoloadComponent {
    fn name(&self) -> &'static str {
        "autoload"
    }

    fn register(&mut self, directive: Directive) -> Result<()> {
        let Directive::Autoload(libs) = directive else {
            return Err(unexpected(self.name(), &directive));
        };
        for (library, identifiers) in libs {
            for identifier in identifiers {
                self.aliases.insert(identifier, library.clone());
            }
        }
        Ok(())
    }

    fn contribute(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let provided: Map<String, Value> = self
            .aliases
            .iter()
            .map(|(identifier, library)| (identifier.clone(), Value::String(library.clone())))
            .collect();
        ctx.config
            .upsert_plugin(PluginSpec::new("provide", Value::Object(provided)));
        Ok(())
    }
}

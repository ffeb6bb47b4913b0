use serde_json::{Value, json};

use super::{Component, ScriptBundle, unexpected};
use crate::builder::BuildContext;
use crate::directive::Directive;
use crate::paths::{ParsedPath, to_url_path};
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct Bundle {
    entries: Vec<ParsedPath>,
    output: ParsedPath,
}

/// JavaScript bundles from `js()` and `react()`.
#[derive(Debug, Default)]
pub struct ScriptComponent {
    bundles: Vec<Bundle>,
    react: bool,
    /// Output directory of the last bundle, relative to the project root
    base: Option<String>,
}

impl ScriptComponent {
    fn entry_name(ctx: &BuildContext<'_>, bundle: &Bundle) -> String {
        ctx.public_relative(&bundle.output.without_ext())
    }
}

impl Component for ScriptComponent {
    fn name(&self) -> &'static str {
        "js"
    }

    fn register(&mut self, directive: Directive) -> Result<()> {
        let Directive::Js(script) = directive else {
            return Err(unexpected(self.name(), &directive));
        };

        if script.entries.is_empty() {
            return Err(Error::configuration("js", "at least one entry file is required"));
        }
        if script.output.as_os_str().is_empty() {
            return Err(Error::configuration("js", "an output path is required"));
        }

        let entries: Vec<ParsedPath> = script.entries.iter().map(ParsedPath::parse).collect();
        let output = ParsedPath::parse(&script.output).or_file(&entries[0].file);

        self.base = Some(output.base());
        self.react |= script.react;
        self.bundles.push(Bundle { entries, output });
        Ok(())
    }

    fn contribute(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        for bundle in &self.bundles {
            let name = Self::entry_name(ctx, bundle);
            let sources = bundle
                .entries
                .iter()
                .map(|entry| to_url_path(&entry.path.to_string_lossy()));
            ctx.config.add_entry(&name, sources);
        }
        Ok(())
    }

    fn extend(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        if !self.react {
            return Ok(());
        }

        ctx.extend_rule_or_fail("react", "jsx", None, |chain| {
            for loader in chain.loaders_mut() {
                if loader.loader != "babel-loader" {
                    continue;
                }
                if !loader.options.is_object() {
                    loader.options = json!({});
                }
                let presets = loader
                    .options
                    .as_object_mut()
                    .map(|options| options.entry("presets").or_insert_with(|| json!([])));
                if let Some(Value::Array(presets)) = presets {
                    if !presets.iter().any(|p| p == "react") {
                        presets.push(json!("react"));
                    }
                }
            }
        })
    }

    fn as_script_bundle(&self) -> Option<&dyn ScriptBundle> {
        Some(self)
    }
}

impl ScriptBundle for ScriptComponent {
    fn bundle_base(&self) -> Option<String> {
        self.base.clone()
    }

    fn primary_entry(&self) -> Option<String> {
        self.bundles
            .first()
            .map(|bundle| bundle.output.without_ext())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::ScriptEntry;

    fn directive(entries: &[&str], output: &str, react: bool) -> Directive {
        Directive::Js(ScriptEntry {
            entries: entries.iter().map(Into::into).collect(),
            output: output.into(),
            react,
        })
    }

    #[test]
    fn directory_output_takes_first_entry_name() {
        let mut js = ScriptComponent::default();
        js.register(directive(&["resources/js/app.js", "resources/js/extra.js"], "public/js", false))
            .unwrap();

        assert_eq!(js.bundles[0].output.path.to_string_lossy(), "public/js/app.js");
        assert_eq!(js.bundle_base().as_deref(), Some("public/js"));
        assert_eq!(js.primary_entry().as_deref(), Some("public/js/app"));
    }

    #[test]
    fn empty_entries_are_rejected() {
        let mut js = ScriptComponent::default();
        let err = js.register(directive(&[], "public/js", false)).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let err = js
            .register(directive(&["resources/js/app.js"], "", false))
            .unwrap_err();
        assert!(err.to_string().contains("output path"));
    }
}

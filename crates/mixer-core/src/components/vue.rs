//! Vue single-file components.
//!
//! Phase 1 adds the `.vue` rule and loader plugin. Phase 2 re-wraps every
//! stylesheet rule so `<style>` blocks compile, either injected inline or
//! extracted into a stylesheet when `extract_vue_styles` is on. Only the
//! shared loaders of a rule change; targets declared by `sass()` and friends
//! keep their own loaders.

use serde_json::{Value, json};

use super::{Component, unexpected};
use crate::build_config::{ExtractTarget, Loader, LoaderChain, ModuleRule, PluginSpec, RuleTest};
use crate::builder::BuildContext;
use crate::directive::Directive;
use crate::paths::to_url_path;
use crate::Result;

#[derive(Debug, Default)]
pub struct VueComponent {
    /// Options for vue-loader
    options: Value,
}

impl VueComponent {
    /// Where extracted component styles go, relative to the public path.
    fn extraction_target(ctx: &BuildContext<'_>) -> ExtractTarget {
        let setting = &ctx.options.extract_vue_styles;
        let sink_file = match setting.file() {
            None => ctx
                .registry
                .last_with_extraction_sink()
                .and_then(|sink| sink.last_extraction_file()),
            Some(_) => None,
        };
        let file = sink_file.unwrap_or_else(|| setting.fallback_file());

        ExtractTarget::shared(ctx.public_relative(&file))
    }

    fn postcss_options(ctx: &BuildContext<'_>) -> Value {
        let mut options = json!({ "ident": "postcss" });
        if let Some(provider) = ctx.registry.last_with_postcss_provider() {
            options["plugins"] = Value::Array(provider.postcss_plugins());
        } else if !ctx.root.join("postcss.config.js").exists() {
            options["plugins"] = json!([]);
        }
        options
    }

    fn sass_options(ctx: &BuildContext<'_>, indented: bool) -> Value {
        let mut options = json!({});
        if indented {
            options["indentedSyntax"] = Value::Bool(true);
        }
        if let Some(global) = &ctx.options.global_vue_styles {
            let resources = ctx.root.join(global);
            options["resources"] = Value::String(to_url_path(&resources.to_string_lossy()));
        }
        options
    }

    fn wrap(ctx: &mut BuildContext<'_>, exts: &[&str], loaders: Vec<Loader>) -> Result<()> {
        let extract = ctx
            .options
            .extract_vue_styles
            .is_enabled()
            .then(|| Self::extraction_target(ctx));
        let fresh = ModuleRule::new(RuleTest::extensions(exts), LoaderChain::default());

        ctx.extend_rule_or_fail("vue", exts[0], Some(fresh), |chain| match extract {
            Some(target) => chain.extract_into(target, loaders),
            None => chain.inline(loaders),
        })
    }
}

impl Component for VueComponent {
    fn name(&self) -> &'static str {
        "vue"
    }

    fn register(&mut self, directive: Directive) -> Result<()> {
        let Directive::Vue(options) = directive else {
            return Err(unexpected(self.name(), &directive));
        };
        mixer_config::merge_values(&mut self.options, &options);
        Ok(())
    }

    fn contribute(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        ctx.config.add_rule(ModuleRule::new(
            RuleTest::extensions(["vue"]),
            LoaderChain::Loaders(vec![Loader::new("vue-loader").with_options(self.options.clone())]),
        ));
        ctx.config
            .add_plugin_once(PluginSpec::new("vue-loader", Value::Null));
        ctx.config
            .resolve
            .alias
            .entry("vue$".to_string())
            .or_insert_with(|| "vue/dist/vue.esm.js".to_string());
        Ok(())
    }

    fn extend(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let postcss = Self::postcss_options(ctx);
        Self::wrap(
            ctx,
            &["css"],
            vec![
                Loader::new("css-loader").with_options(json!({ "importLoaders": 1 })),
                Loader::new("postcss-loader").with_options(postcss),
            ],
        )?;

        Self::wrap(ctx, &["less"], vec!["css-loader".into(), "less-loader".into()])?;

        let sass = Self::sass_options(ctx, true);
        Self::wrap(
            ctx,
            &["sass"],
            vec!["css-loader".into(), Loader::new("sass-loader").with_options(sass)],
        )?;

        let scss = Self::sass_options(ctx, false);
        Self::wrap(
            ctx,
            &["scss"],
            vec!["css-loader".into(), Loader::new("sass-loader").with_options(scss)],
        )?;

        Self::wrap(
            ctx,
            &["styl", "stylus"],
            vec!["css-loader".into(), "stylus-loader".into()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentRegistry;
    use mixer_config::MixOptions;

    #[test]
    fn options_accumulate_across_calls() {
        let mut vue = VueComponent::default();
        vue.register(Directive::Vue(json!({ "esModule": true }))).unwrap();
        vue.register(Directive::Vue(json!({ "hotReload": false }))).unwrap();
        assert_eq!(vue.options, json!({ "esModule": true, "hotReload": false }));
    }

    #[test]
    fn postcss_plugins_default_to_empty_without_config_file() {
        let options = MixOptions::default();
        let registry = ComponentRegistry::new();
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = BuildContext {
            options: &options,
            registry: &registry,
            root: dir.path(),
            config: Default::default(),
        };
        assert_eq!(
            VueComponent::postcss_options(&ctx),
            json!({ "ident": "postcss", "plugins": [] })
        );

        std::fs::write(dir.path().join("postcss.config.js"), "module.exports = {}").unwrap();
        assert_eq!(VueComponent::postcss_options(&ctx), json!({ "ident": "postcss" }));
    }
}

//! Stylesheet compilation: Sass, Less, Stylus and plain PostCSS.
//!
//! Each declared stylesheet becomes an extraction target on the rule for its
//! source extension. Several stylesheets of the same extension share one rule
//! with several targets, each capturing its own source file and carrying its
//! own loaders, so per-call options never leak between stylesheets.

use serde_json::Value;

use super::{Component, ExtractionSink, PostCssProvider, unexpected};
use crate::build_config::{ExtractTarget, Loader, LoaderChain, ModuleRule, RuleTest};
use crate::builder::BuildContext;
use crate::directive::{Directive, PreprocessorKind};
use crate::paths::{ParsedPath, to_url_path};
use crate::{Error, Result};

/// Bundle group stylesheets join when no JavaScript bundle is declared.
pub(crate) const STYLE_ONLY_ENTRY: &str = "mix";

#[derive(Debug, Clone)]
struct Stylesheet {
    src: ParsedPath,
    output: ParsedPath,
    options: Value,
    plugins: Vec<Value>,
}

#[derive(Debug)]
pub struct PreprocessorComponent {
    kind: PreprocessorKind,
    stylesheets: Vec<Stylesheet>,
}

impl PreprocessorComponent {
    pub fn new(kind: PreprocessorKind) -> Self {
        Self {
            kind,
            stylesheets: Vec::new(),
        }
    }

    fn loaders(&self, ctx: &BuildContext<'_>, sheet: &Stylesheet) -> Vec<Loader> {
        let mut loaders = ctx.css_loaders();

        match self.kind.loader() {
            Some(name) => {
                let mut options = match &sheet.options {
                    Value::Object(map) => Value::Object(map.clone()),
                    _ => Value::Object(Default::default()),
                };
                if ctx.options.wants_source_maps() {
                    options["sourceMap"] = Value::Bool(true);
                }
                if self.kind == PreprocessorKind::Sass {
                    // resolve-url-loader needs source maps from sass to rewrite urls
                    loaders.push(Loader::new("resolve-url-loader"));
                    options["sourceMap"] = Value::Bool(true);
                }
                loaders.push(Loader::new(name).with_options(options));
            }
            None if !sheet.plugins.is_empty() => {
                if let Some(postcss) = loaders.iter_mut().find(|l| l.loader == "postcss-loader") {
                    postcss.options["plugins"] = Value::Array(sheet.plugins.clone());
                }
            }
            None => {}
        }

        loaders
    }
}

impl Component for PreprocessorComponent {
    fn name(&self) -> &'static str {
        self.kind.component_name()
    }

    fn register(&mut self, directive: Directive) -> Result<()> {
        let Directive::Preprocess(entry) = directive else {
            return Err(unexpected(self.name(), &directive));
        };

        let src = ParsedPath::parse(&entry.src);
        if src.is_dir || src.ext.is_none() {
            return Err(Error::configuration(
                self.name(),
                format!("source '{}' must be a single stylesheet file", entry.src.display()),
            ));
        }
        if entry.output.as_os_str().is_empty() {
            return Err(Error::configuration(self.name(), "an output path is required"));
        }

        let output = ParsedPath::parse(&entry.output).or_file(&format!("{}.css", src.name));

        self.stylesheets.push(Stylesheet {
            src,
            output,
            options: entry.options,
            plugins: entry.plugins,
        });
        Ok(())
    }

    fn contribute(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let group = match ctx.registry.script_bundle().and_then(|js| js.primary_entry()) {
            Some(primary) => ctx.public_relative(&primary),
            None => STYLE_ONLY_ENTRY.to_string(),
        };

        for sheet in &self.stylesheets {
            let src = to_url_path(&sheet.src.path.to_string_lossy());
            ctx.config.add_entry(&group, [src.clone()]);

            let ext = sheet.src.ext.clone().unwrap_or_default();
            let filename = ctx.public_relative(&to_url_path(&sheet.output.path.to_string_lossy()));
            let target = ExtractTarget::source(filename, src);
            let loaders = self.loaders(ctx, sheet);
            let fresh = ModuleRule::new(RuleTest::extensions([ext.as_str()]), LoaderChain::default());

            ctx.extend_rule_or_fail(self.name(), &ext, Some(fresh), |chain| {
                chain.extract_into(target, loaders)
            })?;
        }
        Ok(())
    }

    fn as_extraction_sink(&self) -> Option<&dyn ExtractionSink> {
        Some(self)
    }

    fn as_postcss_provider(&self) -> Option<&dyn PostCssProvider> {
        (self.kind == PreprocessorKind::PostCss).then_some(self as &dyn PostCssProvider)
    }
}

impl ExtractionSink for PreprocessorComponent {
    fn last_extraction_file(&self) -> Option<String> {
        self.stylesheets
            .last()
            .map(|sheet| to_url_path(&sheet.output.path.to_string_lossy()))
    }
}

impl PostCssProvider for PreprocessorComponent {
    fn postcss_plugins(&self) -> Vec<Value> {
        self.stylesheets
            .first()
            .map(|sheet| sheet.plugins.clone())
            .unwrap_or_default()
    }
}

//! Module rules: which files a rule applies to and the loader chain it runs.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// File test of a module rule.
///
/// Serialized as the regular expression the engine expects
/// (`\.js$`, `\.(?:png|jpe?g)$` style alternations are written out in full).
/// Patterns that are not a plain extension alternation, such as `\.s[ac]ss$`,
/// are kept verbatim and take no part in extension bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTest {
    extensions: Vec<String>,
    raw: Option<String>,
}

impl RuleTest {
    pub fn extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = normalize_ext(ext.as_ref());
            if !ext.is_empty() && !list.contains(&ext) {
                list.push(ext);
            }
        }
        Self {
            extensions: list,
            raw: None,
        }
    }

    /// A test passed through to the engine as written.
    pub fn raw(pattern: impl Into<String>) -> Self {
        Self {
            extensions: Vec::new(),
            raw: Some(pattern.into()),
        }
    }

    pub fn is_raw(&self) -> bool {
        self.raw.is_some()
    }

    /// Extensions claimed by this test, without dots. Empty for raw tests.
    pub fn exts(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty() && self.raw.is_none()
    }

    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = normalize_ext(ext);
        match &self.raw {
            // a raw pattern the regex crate can't read matches nothing here
            Some(pattern) => Regex::new(pattern).is_ok_and(|re| re.is_match(&format!("file.{}", ext))),
            None => self.extensions.iter().any(|claimed| *claimed == ext),
        }
    }

    pub fn matches_path(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .is_some_and(|ext| self.matches_extension(&ext.to_string_lossy()))
    }

    pub fn overlaps(&self, other: &RuleTest) -> bool {
        self.extensions.iter().any(|ext| other.matches_extension(ext))
    }

    /// Drop every extension `other` claims. Returns whether anything changed.
    ///
    /// Raw tests never shrink.
    pub(crate) fn release(&mut self, other: &RuleTest) -> bool {
        let before = self.extensions.len();
        self.extensions.retain(|ext| !other.matches_extension(ext));
        before != self.extensions.len()
    }

    pub fn pattern(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        let escaped: Vec<String> = self.extensions.iter().map(|e| regex::escape(e)).collect();
        match escaped.as_slice() {
            [single] => format!(r"\.{}$", single),
            many => format!(r"\.(?:{})$", many.join("|")),
        }
    }

    /// Parse a pattern produced by [`RuleTest::pattern`].
    pub fn from_pattern(pattern: &str) -> Option<Self> {
        let re = Regex::new(r"^\\\.(?:\(\?:([^()]+)\)|([^()|$\[\]?*+{}]+))\$$").ok()?;

        let caps = re.captures(pattern)?;
        let body = caps.get(1).or_else(|| caps.get(2))?.as_str();
        if body.contains(['[', ']', '?', '*', '+', '{', '}']) {
            return None;
        }
        let test = RuleTest::extensions(body.split('|').map(|ext| ext.replace('\\', "")));
        (!test.is_empty()).then_some(test)
    }
}

fn normalize_ext(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

impl Serialize for RuleTest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.pattern())
    }
}

impl<'de> Deserialize<'de> for RuleTest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        if pattern.is_empty() {
            return Err(serde::de::Error::custom("rule test must not be empty"));
        }
        Ok(RuleTest::from_pattern(&pattern).unwrap_or_else(|| RuleTest::raw(pattern)))
    }
}

/// One loader with optional options.
///
/// Deserializes from either `{ "loader": ..., "options": ... }` or a bare
/// loader name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LoaderSpec")]
pub struct Loader {
    pub loader: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LoaderSpec {
    Name(String),
    Full {
        loader: String,
        #[serde(default)]
        options: Value,
    },
}

impl From<LoaderSpec> for Loader {
    fn from(spec: LoaderSpec) -> Self {
        match spec {
            LoaderSpec::Name(loader) => Loader::new(loader),
            LoaderSpec::Full { loader, options } => Loader::new(loader).with_options(options),
        }
    }
}

impl Loader {
    pub fn new(loader: impl Into<String>) -> Self {
        Self {
            loader: loader.into(),
            options: Value::Null,
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }
}

impl From<&str> for Loader {
    fn from(loader: &str) -> Self {
        Loader::new(loader)
    }
}

/// A stylesheet output that captures matching files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractTarget {
    /// Output file, relative to the public path
    pub filename: String,
    /// Source file routed into this output; `None` captures component styles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    /// Loaders for the included source; empty means the chain's shared loaders
    #[serde(default, rename = "use", skip_serializing_if = "Vec::is_empty")]
    pub loaders: Vec<Loader>,
}

impl ExtractTarget {
    /// Output for files no source-scoped target claims.
    pub fn shared(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            include: None,
            loaders: Vec::new(),
        }
    }

    /// Output for a single source file.
    pub fn source(filename: impl Into<String>, include: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            include: Some(include.into()),
            loaders: Vec::new(),
        }
    }

    fn same_slot(&self, other: &ExtractTarget) -> bool {
        self.filename == other.filename && self.include == other.include
    }
}

/// Loaders whose output is written to standalone stylesheets.
///
/// A file whose path equals a target's `include` is compiled with that
/// target's own loaders (or the shared ones when it has none) and written to
/// its `filename`. Any other file is compiled with the shared `loaders` and
/// goes to the target without `include` if there is one, otherwise it is
/// injected inline through `fallback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractChain {
    pub targets: Vec<ExtractTarget>,
    pub fallback: Loader,
    #[serde(rename = "use")]
    pub loaders: Vec<Loader>,
}

impl ExtractChain {
    /// Add `target` or replace the one writing the same file for the same
    /// source. Source-scoped targets keep `loaders` to themselves; a shared
    /// target sets the chain's shared loaders.
    fn add_target(&mut self, mut target: ExtractTarget, loaders: Vec<Loader>) {
        if target.include.is_some() {
            target.loaders = loaders;
        } else {
            self.loaders = loaders;
        }
        match self.targets.iter_mut().find(|t| t.same_slot(&target)) {
            Some(existing) => *existing = target,
            None => self.targets.push(target),
        }
    }
}

/// Loader chain of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoaderChain {
    Extract(ExtractChain),
    Loaders(Vec<Loader>),
}

impl Default for LoaderChain {
    fn default() -> Self {
        LoaderChain::Loaders(Vec::new())
    }
}

pub(crate) const STYLE_LOADER: &str = "style-loader";

impl LoaderChain {
    /// Shared loaders: the whole chain for plain rules, the loaders for
    /// files outside any source-scoped target for extracting ones.
    pub fn loaders(&self) -> &[Loader] {
        match self {
            LoaderChain::Extract(chain) => &chain.loaders,
            LoaderChain::Loaders(loaders) => loaders,
        }
    }

    pub fn loaders_mut(&mut self) -> &mut Vec<Loader> {
        match self {
            LoaderChain::Extract(chain) => &mut chain.loaders,
            LoaderChain::Loaders(loaders) => loaders,
        }
    }

    pub fn loader_names(&self) -> Vec<&str> {
        self.loaders().iter().map(|l| l.loader.as_str()).collect()
    }

    pub fn targets(&self) -> &[ExtractTarget] {
        match self {
            LoaderChain::Extract(chain) => &chain.targets,
            LoaderChain::Loaders(_) => &[],
        }
    }

    /// Loaders a given source file is compiled with.
    pub fn loaders_for(&self, src: &str) -> &[Loader] {
        self.targets()
            .iter()
            .find(|t| t.include.as_deref() == Some(src) && !t.loaders.is_empty())
            .map_or_else(|| self.loaders(), |t| t.loaders.as_slice())
    }

    /// Extract into `target` with `loaders`, keeping targets already present.
    ///
    /// A plain chain turns into an extracting one; its loaders minus the
    /// style injector become the shared loaders.
    pub fn extract_into(&mut self, target: ExtractTarget, loaders: Vec<Loader>) {
        if let LoaderChain::Loaders(current) = self {
            let shared: Vec<Loader> = std::mem::take(current)
                .into_iter()
                .filter(|l| l.loader != STYLE_LOADER)
                .collect();
            *self = LoaderChain::Extract(ExtractChain {
                targets: Vec::new(),
                fallback: Loader::new(STYLE_LOADER),
                loaders: shared,
            });
        }
        if let LoaderChain::Extract(chain) = self {
            chain.add_target(target, loaders);
        }
    }

    /// Inject styles inline with `loaders`.
    ///
    /// Only the shared loaders change; extraction targets and their loaders
    /// survive.
    pub fn inline(&mut self, loaders: Vec<Loader>) {
        match self {
            LoaderChain::Extract(chain) => chain.loaders = loaders,
            LoaderChain::Loaders(current) => {
                let mut chain = Vec::with_capacity(loaders.len() + 1);
                chain.push(Loader::new(STYLE_LOADER));
                chain.extend(loaders);
                *current = chain;
            }
        }
    }
}

/// A module rule: extension test plus loader chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRule {
    pub test: RuleTest,
    #[serde(rename = "use")]
    pub loaders: LoaderChain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    /// Rule keys passed through to the engine untouched (`include`, `oneOf`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModuleRule {
    pub fn new(test: RuleTest, loaders: LoaderChain) -> Self {
        Self {
            test,
            loaders,
            exclude: None,
            extra: Map::new(),
        }
    }

    pub fn with_loaders<I, L>(extensions: &[&str], loaders: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Loader>,
    {
        Self::new(
            RuleTest::extensions(extensions),
            LoaderChain::Loaders(loaders.into_iter().map(Into::into).collect()),
        )
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude = Some(pattern.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pattern_round_trips_through_serde() {
        let test = RuleTest::extensions(["png", ".JPG", "jpeg", "png"]);
        assert_eq!(test.exts(), ["png", "jpg", "jpeg"]);
        assert_eq!(test.pattern(), r"\.(?:png|jpg|jpeg)$");

        let value = serde_json::to_value(&test).unwrap();
        let back: RuleTest = serde_json::from_value(value).unwrap();
        assert_eq!(back, test);

        let single: RuleTest = serde_json::from_value(json!(r"\.vue$")).unwrap();
        assert_eq!(single.exts(), ["vue"]);
    }

    #[test]
    fn other_patterns_are_kept_verbatim() {
        let test: RuleTest = serde_json::from_value(json!(r"\.s[ac]ss$")).unwrap();
        assert!(test.is_raw());
        assert!(test.exts().is_empty());
        assert!(!test.is_empty());
        assert!(test.matches_extension("sass"));
        assert!(test.matches_path("resources/sass/app.scss"));
        assert!(!test.matches_extension("css"));
        assert_eq!(serde_json::to_value(&test).unwrap(), json!(r"\.s[ac]ss$"));

        let optional: RuleTest = serde_json::from_value(json!(r"\.(?:jpe?g|png)$")).unwrap();
        assert!(optional.is_raw());

        let empty: Result<RuleTest, _> = serde_json::from_value(json!(""));
        assert!(empty.is_err());
    }

    #[test]
    fn raw_tests_shadow_the_extensions_they_match() {
        let mut styles = RuleTest::extensions(["scss", "sass", "less"]);
        assert!(styles.release(&RuleTest::raw(r"\.s[ac]ss$")));
        assert_eq!(styles.exts(), ["less"]);
    }

    #[test]
    fn release_drops_shadowed_extensions() {
        let mut images = RuleTest::extensions(["png", "svg", "gif"]);
        assert!(images.release(&RuleTest::extensions(["svg"])));
        assert_eq!(images.exts(), ["png", "gif"]);
        assert!(!images.release(&RuleTest::extensions(["css"])));
    }

    #[test]
    fn matches_path_by_extension() {
        let test = RuleTest::extensions(["scss"]);
        assert!(test.matches_path("resources/sass/app.scss"));
        assert!(!test.matches_path("resources/sass/app.sass"));
        assert!(test.matches_extension(".SCSS"));
    }

    #[test]
    fn extract_into_keeps_existing_targets() {
        let mut chain = LoaderChain::Loaders(vec!["style-loader".into(), "css-loader".into()]);
        chain.extract_into(
            ExtractTarget::source("css/app.css", "resources/app.scss"),
            vec!["css-loader".into(), "sass-loader".into()],
        );
        assert_eq!(chain.loader_names(), ["css-loader"]);

        chain.extract_into(
            ExtractTarget::shared("css/vue-styles.css"),
            vec!["css-loader".into(), "vue-style-loader".into()],
        );

        assert_eq!(chain.targets().len(), 2);
        assert_eq!(chain.loader_names(), ["css-loader", "vue-style-loader"]);
        let names: Vec<&str> = chain
            .loaders_for("resources/app.scss")
            .iter()
            .map(|l| l.loader.as_str())
            .collect();
        assert_eq!(names, ["css-loader", "sass-loader"]);
    }

    #[test]
    fn each_source_keeps_its_own_loaders() {
        let mut chain = LoaderChain::default();
        for (src, path) in [("resources/a.scss", "A"), ("resources/b.scss", "B")] {
            chain.extract_into(
                ExtractTarget::source("css/app.css", src),
                vec![Loader::new("sass-loader").with_options(json!({ "includePaths": [path] }))],
            );
        }
        chain.inline(vec!["css-loader".into()]);

        assert_eq!(chain.targets().len(), 2);
        assert_eq!(chain.loaders_for("resources/a.scss")[0].options["includePaths"], json!(["A"]));
        assert_eq!(chain.loaders_for("resources/b.scss")[0].options["includePaths"], json!(["B"]));
        assert_eq!(chain.loader_names(), ["css-loader"]);

        // re-declaring a source replaces its target instead of adding one
        chain.extract_into(
            ExtractTarget::source("css/app.css", "resources/a.scss"),
            vec![Loader::new("sass-loader")],
        );
        assert_eq!(chain.targets().len(), 2);
        assert!(chain.loaders_for("resources/a.scss")[0].options.is_null());
    }

    #[test]
    fn inline_prepends_style_loader_for_plain_chains() {
        let mut chain = LoaderChain::default();
        chain.inline(vec!["css-loader".into(), "less-loader".into()]);
        assert_eq!(chain.loader_names(), ["style-loader", "css-loader", "less-loader"]);
    }

    #[test]
    fn loader_chain_deserializes_both_shapes() {
        let plain: LoaderChain = serde_json::from_value(json!([{ "loader": "vue-loader" }])).unwrap();
        assert_eq!(plain.loader_names(), ["vue-loader"]);

        let shorthand: LoaderChain = serde_json::from_value(json!(["style-loader", "css-loader"])).unwrap();
        assert_eq!(shorthand.loader_names(), ["style-loader", "css-loader"]);

        let extract: LoaderChain = serde_json::from_value(json!({
            "targets": [{ "filename": "css/app.css" }],
            "fallback": { "loader": "style-loader" },
            "use": [{ "loader": "css-loader" }]
        }))
        .unwrap();
        assert_eq!(extract.targets()[0].filename, "css/app.css");
    }

    #[test]
    fn unknown_rule_keys_survive() {
        let rule: ModuleRule = serde_json::from_value(json!({
            "test": r"\.md$",
            "use": ["raw-loader"],
            "include": "/docs/"
        }))
        .unwrap();
        assert_eq!(rule.extra["include"], "/docs/");
        assert_eq!(serde_json::to_value(&rule).unwrap()["include"], "/docs/");
    }
}

//! Directives: one record per user intent.
//!
//! A directive is built by the `Mix` façade, handed to the registry and folded
//! into the state of the component named by [`Directive::component`].

use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;

/// Stylesheet languages with a dedicated component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreprocessorKind {
    Sass,
    Less,
    Stylus,
    PostCss,
}

impl PreprocessorKind {
    pub fn component_name(self) -> &'static str {
        match self {
            PreprocessorKind::Sass => "sass",
            PreprocessorKind::Less => "less",
            PreprocessorKind::Stylus => "stylus",
            PreprocessorKind::PostCss => "post_css",
        }
    }

    /// Engine loader compiling the language, if any beyond PostCSS.
    pub fn loader(self) -> Option<&'static str> {
        match self {
            PreprocessorKind::Sass => Some("sass-loader"),
            PreprocessorKind::Less => Some("less-loader"),
            PreprocessorKind::Stylus => Some("stylus-loader"),
            PreprocessorKind::PostCss => None,
        }
    }
}

impl std::str::FromStr for PreprocessorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sass" | "scss" => Ok(PreprocessorKind::Sass),
            "less" => Ok(PreprocessorKind::Less),
            "stylus" | "styl" => Ok(PreprocessorKind::Stylus),
            "postcss" | "post_css" | "css" => Ok(PreprocessorKind::PostCss),
            other => Err(format!("Unknown preprocessor: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEntry {
    pub entries: Vec<PathBuf>,
    pub output: PathBuf,
    pub react: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StylesheetEntry {
    pub kind: PreprocessorKind,
    pub src: PathBuf,
    pub output: PathBuf,
    /// Options forwarded to the language loader
    pub options: Value,
    /// PostCSS plugins (only meaningful for `PostCss`)
    pub plugins: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorExtract {
    pub libs: Vec<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopySpec {
    pub from: PathBuf,
    pub to: PathBuf,
    pub flatten: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombineSpec {
    pub sources: Vec<PathBuf>,
    pub output: PathBuf,
}

/// One user intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Js(ScriptEntry),
    Preprocess(StylesheetEntry),
    Vue(Value),
    Extract(VendorExtract),
    /// Library -> identifiers it is provided as
    Autoload(IndexMap<String, Vec<String>>),
    BrowserSync(Value),
    Copy(CopySpec),
    Combine(CombineSpec),
    Version(Vec<PathBuf>),
}

impl Directive {
    /// Name of the component this directive accumulates into.
    pub fn component(&self) -> &'static str {
        match self {
            Directive::Js(_) => "js",
            Directive::Preprocess(entry) => entry.kind.component_name(),
            Directive::Vue(_) => "vue",
            Directive::Extract(_) => "extract",
            Directive::Autoload(_) => "autoload",
            Directive::BrowserSync(_) => "browser_sync",
            Directive::Copy(_) => "copy",
            Directive::Combine(_) => "combine",
            Directive::Version(_) => "version",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocessors_route_to_their_own_component() {
        let directive = Directive::Preprocess(StylesheetEntry {
            kind: "scss".parse().unwrap(),
            src: "resources/app.scss".into(),
            output: "public/css".into(),
            options: Value::Null,
            plugins: Vec::new(),
        });
        assert_eq!(directive.component(), "sass");
        assert!("coffee".parse::<PreprocessorKind>().is_err());
    }
}

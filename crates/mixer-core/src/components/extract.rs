//! Vendor library extraction.
//!
//! Libraries listed in `extract()` move into their own bundle next to the
//! application scripts, alongside a small runtime `manifest` chunk, so vendor
//! code keeps its cache entry while application code changes.

use serde_json::json;

use super::{Component, unexpected};
use crate::build_config::PluginSpec;
use crate::builder::BuildContext;
use crate::directive::{Directive, VendorExtract};
use crate::{Error, Result};

const SPLIT_CHUNKS: &str = "split-chunks";

#[derive(Debug, Default)]
pub struct VendorComponent {
    extractions: Vec<VendorExtract>,
}

impl VendorComponent {
    fn join(base: &str, name: &str) -> String {
        if base.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", base.trim_end_matches('/'), name)
        }
    }
}

impl Component for VendorComponent {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["js"]
    }

    fn register(&mut self, directive: Directive) -> Result<()> {
        let Directive::Extract(extract) = directive else {
            return Err(unexpected(self.name(), &directive));
        };
        if extract.libs.is_empty() {
            return Err(Error::configuration(
                self.name(),
                "at least one library to extract is required",
            ));
        }
        self.extractions.push(extract);
        Ok(())
    }

    fn contribute(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let base = ctx
            .registry
            .script_bundle()
            .and_then(|js| js.bundle_base())
            .map(|base| ctx.public_relative(&base))
            .ok_or_else(|| Error::configuration(self.name(), "no JavaScript bundle to extract from"))?;

        let mut names = Vec::with_capacity(self.extractions.len() + 1);
        for extraction in &self.extractions {
            let name = match &extraction.output {
                Some(output) => ctx.public_relative(output.trim_end_matches(".js")),
                None => Self::join(&base, "vendor"),
            };
            ctx.config.add_entry(&name, extraction.libs.iter().cloned());
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names.push(Self::join(&base, "manifest"));

        ctx.config.upsert_plugin(PluginSpec::new(
            SPLIT_CHUNKS,
            json!({ "names": names, "minChunks": "Infinity" }),
        ));
        Ok(())
    }
}

use serde_json::{Value, json};

use super::{Component, unexpected};
use crate::build_config::PluginSpec;
use crate::builder::BuildContext;
use crate::directive::Directive;
use crate::Result;

/// Live reloading through a Browsersync proxy.
#[derive(Debug, Default)]
pub struct BrowserSyncComponent {
    config: Value,
}

impl Component for BrowserSyncComponent {
    fn name(&self) -> &'static str {
        "browser_sync"
    }

    fn register(&mut self, directive: Directive) -> Result<()> {
        let Directive::BrowserSync(config) = directive else {
            return Err(unexpected(self.name(), &directive));
        };
        let config = match config {
            Value::String(proxy) => json!({ "proxy": proxy }),
            Value::Null => json!({}),
            other => other,
        };
        mixer_config::merge_values(&mut self.config, &config);
        Ok(())
    }

    fn contribute(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let public = ctx.options.public_path_str();
        let mut options = json!({
            "host": "localhost",
            "port": 3000,
            "proxy": "app.dev",
            "files": [
                "app/**/*.php",
                "resources/views/**/*.php",
                format!("{}/js/**/*.js", public),
                format!("{}/css/**/*.css", public),
            ],
        });
        mixer_config::merge_values(&mut options, &self.config);
        ctx.config
            .upsert_plugin(PluginSpec::new("browser-sync", options));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_config_is_a_proxy() {
        let mut sync = BrowserSyncComponent::default();
        sync.register(Directive::BrowserSync(json!("my-domain.test")))
            .unwrap();
        assert_eq!(sync.config, json!({ "proxy": "my-domain.test" }));
    }
}

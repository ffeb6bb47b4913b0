use std::path::PathBuf;

use super::{Component, unexpected};
use crate::builder::BuildContext;
use crate::directive::Directive;
use crate::Result;

/// Files and directories passed to `version()`.
///
/// Directories are expanded only when the manifest is reconciled, so files
/// produced during the build are picked up.
#[derive(Debug, Default)]
pub struct VersionComponent {
    targets: Vec<PathBuf>,
}

impl Component for VersionComponent {
    fn name(&self) -> &'static str {
        "version"
    }

    fn register(&mut self, directive: Directive) -> Result<()> {
        let Directive::Version(targets) = directive else {
            return Err(unexpected(self.name(), &directive));
        };
        for target in targets {
            if !self.targets.contains(&target) {
                self.targets.push(target);
            }
        }
        Ok(())
    }

    fn contribute(&self, _ctx: &mut BuildContext<'_>) -> Result<()> {
        Ok(())
    }

    fn versioned_targets(&self) -> &[PathBuf] {
        &self.targets
    }
}

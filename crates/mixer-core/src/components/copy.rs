use std::path::Path;

use super::{Component, unexpected};
use crate::builder::BuildContext;
use crate::directive::{CopySpec, Directive};
use crate::paths;
use crate::tasks::Task;
use crate::{Error, Result};

/// File and directory copies performed after compilation.
#[derive(Debug, Default)]
pub struct CopyComponent {
    copies: Vec<CopySpec>,
}

impl Component for CopyComponent {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn register(&mut self, directive: Directive) -> Result<()> {
        let Directive::Copy(copy) = directive else {
            return Err(unexpected(self.name(), &directive));
        };
        if copy.to.as_os_str().is_empty() {
            return Err(Error::configuration(self.name(), "a destination is required"));
        }
        self.copies.push(copy);
        Ok(())
    }

    fn contribute(&self, _ctx: &mut BuildContext<'_>) -> Result<()> {
        Ok(())
    }

    fn tasks(&self, root: &Path) -> Vec<Task> {
        self.copies
            .iter()
            .map(|copy| Task::Copy {
                from: paths::resolve(root, &copy.from),
                to: paths::resolve(root, &copy.to),
                flatten: copy.flatten,
            })
            .collect()
    }
}

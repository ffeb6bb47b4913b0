use std::path::Path;

use super::{Component, unexpected};
use crate::builder::BuildContext;
use crate::directive::{CombineSpec, Directive};
use crate::paths::{self, ParsedPath};
use crate::tasks::Task;
use crate::{Error, Result};

/// Concatenations from `combine()`, `scripts()`, `styles()` and `minify()`.
#[derive(Debug, Default)]
pub struct CombineComponent {
    jobs: Vec<CombineSpec>,
}

impl Component for CombineComponent {
    fn name(&self) -> &'static str {
        "combine"
    }

    fn register(&mut self, directive: Directive) -> Result<()> {
        let Directive::Combine(job) = directive else {
            return Err(unexpected(self.name(), &directive));
        };
        if job.sources.is_empty() {
            return Err(Error::configuration(self.name(), "at least one source file is required"));
        }
        if ParsedPath::parse(&job.output).is_dir {
            return Err(Error::configuration(
                self.name(),
                format!("output '{}' must be a file", job.output.display()),
            ));
        }
        self.jobs.push(job);
        Ok(())
    }

    fn contribute(&self, _ctx: &mut BuildContext<'_>) -> Result<()> {
        Ok(())
    }

    fn tasks(&self, root: &Path) -> Vec<Task> {
        self.jobs
            .iter()
            .map(|job| Task::Concat {
                sources: job
                    .sources
                    .iter()
                    .map(|source| paths::resolve(root, source))
                    .collect(),
                output: paths::resolve(root, &job.output),
            })
            .collect()
    }
}

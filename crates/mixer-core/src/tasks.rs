//! Post-compile file tasks: copying and concatenation.
//!
//! Tasks run after the engine has written its outputs, in component
//! registration order, so a task may consume what an earlier one produced.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::paths::ParsedPath;
use crate::writer::write_atomic;
use crate::{Error, Result};

/// One unit of post-compile work. Paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Copy a file or directory.
    ///
    /// With `flatten`, files found in subdirectories land directly in `to`.
    Copy {
        from: PathBuf,
        to: PathBuf,
        flatten: bool,
    },
    /// Join `sources` with newlines into `output`.
    Concat {
        sources: Vec<PathBuf>,
        output: PathBuf,
    },
}

impl Task {
    /// Run the task, returning every file it wrote.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        match self {
            Task::Copy { from, to, flatten } => copy(from, to, *flatten),
            Task::Concat { sources, output } => concat(sources, output).map(|()| vec![output.clone()]),
        }
    }
}

fn copy(from: &Path, to: &Path, flatten: bool) -> Result<Vec<PathBuf>> {
    if from.is_file() {
        let dest = if ParsedPath::parse(to).is_dir {
            to.join(from.file_name().unwrap_or_default())
        } else {
            to.to_path_buf()
        };
        copy_file(from, &dest)?;
        return Ok(vec![dest]);
    }

    if !from.is_dir() {
        return Err(Error::io(
            format!("Failed to copy '{}'", from.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "source does not exist"),
        ));
    }

    let mut written = Vec::new();
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            Error::io(format!("Failed to read directory '{}'", from.display()), e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let dest = if flatten {
            to.join(entry.file_name())
        } else {
            match entry.path().strip_prefix(from) {
                Ok(relative) => to.join(relative),
                Err(_) => to.join(entry.file_name()),
            }
        };
        copy_file(entry.path(), &dest)?;
        written.push(dest);
    }

    tracing::debug!(from = %from.display(), files = written.len(), "copied directory");
    Ok(written)
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::io(format!("Failed to create directory '{}'", parent.display()), e)
        })?;
    }
    fs::copy(from, to).map_err(|e| {
        Error::io(
            format!("Failed to copy '{}' to '{}'", from.display(), to.display()),
            e,
        )
    })?;
    Ok(())
}

fn concat(sources: &[PathBuf], output: &Path) -> Result<()> {
    let mut parts = Vec::with_capacity(sources.len());
    for source in sources {
        let content = fs::read_to_string(source).map_err(|e| {
            Error::io(format!("Failed to read '{}' for concatenation", source.display()), e)
        })?;
        parts.push(content);
    }

    write_atomic(output, parts.join("\n").as_bytes())?;
    tracing::debug!(output = %output.display(), sources = sources.len(), "combined files");
    Ok(())
}

//! The compile engine contract.
//!
//! Mixer never bundles anything itself. An engine consumes the assembled
//! [`BuildConfig`], writes its outputs below `output.path` and reports what it
//! wrote as [`Stats`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::build_config::BuildConfig;
use crate::Result;

/// Something that can compile a [`BuildConfig`].
pub trait CompileEngine {
    fn compile(&mut self, config: &BuildConfig) -> Result<Stats>;
}

impl<F> CompileEngine for F
where
    F: FnMut(&BuildConfig) -> Result<Stats>,
{
    fn compile(&mut self, config: &BuildConfig) -> Result<Stats> {
        self(config)
    }
}

/// Report of one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Chunk name -> emitted asset path(s), relative to the public directory
    #[serde(default)]
    pub assets_by_chunk_name: BTreeMap<String, ChunkAssets>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Stats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Every emitted asset path, chunk by chunk.
    pub fn asset_paths(&self) -> impl Iterator<Item = &str> {
        self.assets_by_chunk_name
            .values()
            .flat_map(|assets| assets.paths())
    }
}

/// Assets of one chunk: a single path or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkAssets {
    One(String),
    Many(Vec<String>),
}

impl ChunkAssets {
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            ChunkAssets::One(path) => std::slice::from_ref(path),
            ChunkAssets::Many(paths) => paths,
        };
        slice.iter().map(String::as_str)
    }

    /// Keep only paths accepted by `keep`; returns whether the chunk is now empty.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> bool {
        match self {
            ChunkAssets::One(path) => !keep(path),
            ChunkAssets::Many(paths) => {
                paths.retain(|path| keep(path));
                paths.is_empty()
            }
        }
    }
}

#![cfg_attr(docsrs, feature(doc_cfg))]

//! # mixer-core
//!
//! Turns a sequence of build directives into one bundler configuration, and
//! turns the bundler's report into a versioned asset manifest.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mixer_core::{BuildConfig, Mix, Stats};
//!
//! # fn main() -> mixer_core::Result<()> {
//! let mut mix = Mix::discover(".", None)?;
//! mix.js(["resources/js/app.js"], "public/js")?
//!     .sass("resources/sass/app.scss", "public/css")?
//!     .version(Vec::<&str>::new())?;
//! mix.then(|manifest| println!("{} assets", manifest.len()));
//!
//! // Any bundler driver implementing `CompileEngine` (closures do).
//! let mut engine = |config: &BuildConfig| {
//!     let _ = serde_json::to_string(config);
//!     Ok::<_, mixer_core::Error>(Stats::default())
//! };
//! let manifest = mix.build(&mut engine)?;
//! # let _ = manifest;
//! # Ok(())
//! # }
//! ```
//!
//! ## Pieces
//!
//! - [`paths`]: path classification and logical/physical mapping
//! - [`components`]: the component contract and registry directives feed
//! - [`builder`]: two-phase configuration assembly
//! - [`manifest`] and [`hash`]: reconciliation and content versioning
//! - [`events`]: post-build callbacks

pub mod build_config;
pub mod builder;
pub mod components;
pub mod directive;
pub mod engine;
pub mod events;
pub mod hash;
pub mod manifest;
pub mod paths;
pub mod tasks;

mod error;
mod mix;
mod writer;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

pub use build_config::{BuildConfig, Loader, LoaderChain, ModuleRule, PluginSpec, RuleTest};
pub use builder::{BuildContext, ConfigBuilder};
pub use components::{Component, ComponentRegistry, ExtractionSink, PostCssProvider, ScriptBundle};
pub use directive::{Directive, PreprocessorKind};
pub use engine::{ChunkAssets, CompileEngine, Stats};
pub use error::{Error, Result};
pub use events::{Event, EventBus};
pub use hash::{VersionToken, VersionedFileSet, Versioner, hash_file};
pub use manifest::{Manifest, ManifestMap};
pub use mix::Mix;
pub use tasks::Task;

pub use mixer_config::{MixConfig, MixOptions};

//! Spress - the orchestration core of a static site build.
//!
//! Items come from a [`DataSource`], flow through collection
//! classification, generators, sorting, conversion, permalinks and two
//! render passes, and end up in a [`DataWriter`]. [`Pipeline`] sequences
//! all of it; every collaborator sits behind a trait so embedders can
//! swap it.
//!
//! ```ignore
//! use spress::{BuildOptions, MemorySource, Pipeline, SiteConfig};
//!
//! let config = SiteConfig::from_path("spress.toml".as_ref())?;
//! config.validate()?;
//!
//! let mut pipeline = Pipeline::from_config(&config, MemorySource::new());
//! let items = pipeline.build(&BuildOptions::from_config(&config))?;
//! ```

pub mod logger;

pub mod attributes;
pub mod collection;
pub mod config;
pub mod converter;
pub mod deps;
pub mod error;
pub mod events;
pub mod generator;
pub mod item;
pub mod permalink;
pub mod pipeline;
pub mod plugin;
pub mod renderer;
pub mod site;
pub mod source;
pub mod store;
pub mod utils;
pub mod writer;

pub use attributes::AttributeBag;
pub use collection::{Collection, CollectionManager};
pub use config::SiteConfig;
pub use converter::{ConversionResult, Converter, ConverterManager, ItemConverter};
pub use deps::{DependencyGraph, DependencyTracker};
pub use error::BuildError;
pub use events::{Event, EventDispatcher, HookPoint};
pub use generator::{Generator, GeneratorManager, PaginationGenerator};
pub use item::{Item, PathSnapshot, Snapshot};
pub use permalink::{Permalink, PermalinkGenerator, PermalinkResolver};
pub use pipeline::{BuildOptions, Phase, Pipeline};
pub use plugin::{Plugin, PluginManager};
pub use renderer::{LayoutRenderizer, Renderizer};
pub use source::{DataSource, MemorySource};
pub use writer::{DataWriter, FilesystemWriter, MemoryWriter};

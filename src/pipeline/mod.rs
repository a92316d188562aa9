//! Build orchestration.
//!
//! A [`Pipeline`] owns the collaborators of a site build and runs them in
//! a fixed sequence of phases over a single item store:
//!
//! ```text
//! Reset → Setup → PluginInit → Load → Classify → GeneratorExpand
//!       → SortAndLink → PrepareRender → Convert → Permalink
//!       → RenderBlocks → RenderPage (+ write) → Finish
//! ```
//!
//! Each phase finishes for every item before the next one starts, and
//! items are visited in store order. The first error aborts the build;
//! items already written stay written.
//!
//! # Example
//!
//! ```ignore
//! let writer = MemoryWriter::new();
//! let mut pipeline = Pipeline::new(source).with_writer(writer.clone());
//! let items = pipeline.build(&BuildOptions::default())?;
//! ```

mod options;
mod phases;
mod validate;

#[cfg(test)]
mod tests;

pub use options::BuildOptions;

use crate::{
    collection::CollectionManager,
    config::SiteConfig,
    converter::{ConverterManager, ItemConverter},
    deps::DependencyTracker,
    error::BuildError,
    events::{Event, EventDispatcher},
    generator::GeneratorManager,
    item::Item,
    permalink::{PermalinkGenerator, PermalinkResolver},
    plugin::{Plugin, PluginManager},
    renderer::{LayoutRenderizer, Renderizer},
    site::SiteAttributes,
    source::DataSource,
    store::ItemStore,
    vlog,
    writer::{DataWriter, FilesystemWriter, MemoryWriter},
};
use anyhow::Result;
use chrono_tz::Tz;
use std::collections::BTreeMap;

// ============================================================================
// Phases
// ============================================================================

/// Pipeline states, in the order a build enters them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// No build has started.
    Idle,
    Reset,
    Setup,
    PluginInit,
    Load,
    Classify,
    GeneratorExpand,
    SortAndLink,
    PrepareRender,
    Convert,
    Permalink,
    RenderBlocks,
    RenderPage,
    Finish,
}

impl Phase {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reset => "reset",
            Self::Setup => "setup",
            Self::PluginInit => "plugin init",
            Self::Load => "load",
            Self::Classify => "classify",
            Self::GeneratorExpand => "generators",
            Self::SortAndLink => "sort",
            Self::PrepareRender => "prepare render",
            Self::Convert => "convert",
            Self::Permalink => "permalink",
            Self::RenderBlocks => "render blocks",
            Self::RenderPage => "render page",
            Self::Finish => "finish",
        }
    }
}

// ============================================================================
// Hooks
// ============================================================================

/// Listeners registered by the embedder, then those registered by plugins.
///
/// Plugin listeners are rebuilt on every build; embedder listeners persist.
#[derive(Debug, Default)]
struct Hooks {
    embedder: EventDispatcher,
    plugins: EventDispatcher,
}

impl Hooks {
    fn dispatch(&mut self, event: &mut Event<'_>) -> Result<()> {
        self.embedder.dispatch(&mut *event)?;
        self.plugins.dispatch(event)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Site build orchestrator.
pub struct Pipeline {
    source: Box<dyn DataSource>,
    writer: Box<dyn DataWriter>,
    converter: Box<dyn ItemConverter>,
    generators: GeneratorManager,
    permalinks: Box<dyn PermalinkResolver>,
    renderer: Box<dyn Renderizer>,
    collections: CollectionManager,
    plugins: PluginManager,
    hooks: Hooks,
    dependency_tracker: Option<Box<dyn DependencyTracker>>,

    store: ItemStore,
    site: SiteAttributes,
    layouts: BTreeMap<String, Item>,
    includes: BTreeMap<String, Item>,
    timezone: Tz,
    phase: Phase,
}

impl Pipeline {
    /// Pipeline reading from `source` with the default collaborators:
    /// an in-memory writer, converter manager, `pagination` generator,
    /// pretty permalinks, layout renderer and the `pages` collection.
    pub fn new(source: impl DataSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            writer: Box::new(MemoryWriter::new()),
            converter: Box::new(ConverterManager::new()),
            generators: GeneratorManager::new(),
            permalinks: Box::new(PermalinkGenerator::default()),
            renderer: Box::new(LayoutRenderizer::new()),
            collections: CollectionManager::new(),
            plugins: PluginManager::new(),
            hooks: Hooks::default(),
            dependency_tracker: None,
            store: ItemStore::new(),
            site: SiteAttributes::new(),
            layouts: BTreeMap::new(),
            includes: BTreeMap::new(),
            timezone: Tz::UTC,
            phase: Phase::Idle,
        }
    }

    /// Pipeline wired from `config`: its collections, default permalink
    /// style and a file-system writer at the configured output directory.
    pub fn from_config(config: &SiteConfig, source: impl DataSource + 'static) -> Self {
        let writer = FilesystemWriter::new(&config.build.output).with_clean(config.build.clean);
        Self::new(source)
            .with_collections(config.collection_manager())
            .with_permalink_resolver(PermalinkGenerator::new(&config.build.permalink))
            .with_writer(writer)
    }

    pub fn with_writer(mut self, writer: impl DataWriter + 'static) -> Self {
        self.writer = Box::new(writer);
        self
    }

    pub fn with_converter(mut self, converter: impl ItemConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn with_generators(mut self, generators: GeneratorManager) -> Self {
        self.generators = generators;
        self
    }

    pub fn with_permalink_resolver(mut self, resolver: impl PermalinkResolver + 'static) -> Self {
        self.permalinks = Box::new(resolver);
        self
    }

    pub fn with_renderer(mut self, renderer: impl Renderizer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_collections(mut self, collections: CollectionManager) -> Self {
        self.collections = collections;
        self
    }

    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.add(plugin);
        self
    }

    /// Listener registry kept across builds.
    pub fn events_mut(&mut self) -> &mut EventDispatcher {
        &mut self.hooks.embedder
    }

    pub fn generators_mut(&mut self) -> &mut GeneratorManager {
        &mut self.generators
    }

    /// Attach the dependency tracker. Only one may ever be attached.
    pub fn set_dependency_tracker(
        &mut self,
        tracker: impl DependencyTracker + 'static,
    ) -> Result<(), BuildError> {
        if self.dependency_tracker.is_some() {
            return Err(BuildError::Configuration(
                "A dependency tracker is already attached".into(),
            ));
        }
        self.dependency_tracker = Some(Box::new(tracker));
        Ok(())
    }

    /// Last phase entered.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Site attributes as of the last phase that touched them.
    pub fn site(&self) -> &SiteAttributes {
        &self.site
    }

    /// Run a full build, returning the final item set in store order.
    pub fn build(&mut self, options: &BuildOptions) -> Result<Vec<Item>, BuildError> {
        self.reset();
        self.setup(options)?;
        self.initialize_plugins(options)?;
        let loaded = self.load(options)?;
        let triggers = self.classify(loaded, options)?;
        self.expand_generators(triggers)?;
        self.sort_and_link()?;
        self.prepare_render();
        self.convert()?;
        self.resolve_permalinks()?;
        self.render_blocks()?;
        self.render_pages()?;
        self.finish(options)?;

        Ok(std::mem::take(&mut self.store).into_items())
    }

    fn enter(&mut self, phase: Phase) {
        debug_assert!(phase >= self.phase || phase == Phase::Reset);
        self.phase = phase;
        vlog!("build"; "{}", phase.name());
    }
}

//! Named extension points fired around each pipeline phase.
//!
//! Listeners register against a [`HookPoint`] and receive the matching
//! [`Event`] payload by mutable reference. Dispatch is synchronous and in
//! registration order; whatever a listener writes into the payload is what
//! the phase reads back afterwards.
//!
//! | Hook | Payload | Snapshots |
//! |------|---------|-----------|
//! | `start` | [`StartEvent`] | - |
//! | `before_convert` | [`ContentEvent`] | `Raw`, `Relative` |
//! | `after_convert` | [`ContentEvent`] | `AfterConvert`, `RelativeAfterConvert` |
//! | `before_render_blocks` | [`ContentEvent`] | `AfterConvert`, `RelativeAfterConvert` |
//! | `after_render_blocks` | [`ContentEvent`] | `AfterRenderBlocks`, `RelativeAfterConvert` |
//! | `before_render_page` | [`ContentEvent`] | `AfterRenderBlocks`, `RelativeAfterConvert` |
//! | `after_render_page` | [`ContentEvent`] | `AfterRenderPage`, `RelativeAfterConvert` |
//! | `finish` | [`FinishEvent`] | - |
//!
//! # Example
//!
//! ```ignore
//! dispatcher.listen(HookPoint::BeforeConvert, |event| {
//!     if let Some(event) = event.as_content_mut() {
//!         let body = event.content().replace("TODO", "");
//!         event.set_content(body);
//!     }
//!     Ok(())
//! });
//! ```

use crate::{
    attributes::AttributeBag,
    converter::ItemConverter,
    generator::GeneratorManager,
    item::{Item, PathSnapshot, Snapshot},
    renderer::Renderizer,
    source::DataSource,
    writer::DataWriter,
};
use anyhow::Result;
use rustc_hash::FxHashMap;
use std::fmt;

// ============================================================================
// Hook Points
// ============================================================================

/// Extension points, in the order a build fires them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookPoint {
    Start,
    BeforeConvert,
    AfterConvert,
    BeforeRenderBlocks,
    AfterRenderBlocks,
    BeforeRenderPage,
    AfterRenderPage,
    Finish,
}

impl HookPoint {
    pub const ALL: [Self; 8] = [
        Self::Start,
        Self::BeforeConvert,
        Self::AfterConvert,
        Self::BeforeRenderBlocks,
        Self::AfterRenderBlocks,
        Self::BeforeRenderPage,
        Self::AfterRenderPage,
        Self::Finish,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::BeforeConvert => "before_convert",
            Self::AfterConvert => "after_convert",
            Self::BeforeRenderBlocks => "before_render_blocks",
            Self::AfterRenderBlocks => "after_render_blocks",
            Self::BeforeRenderPage => "before_render_page",
            Self::AfterRenderPage => "after_render_page",
            Self::Finish => "finish",
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Payload of `start`: the build environment.
///
/// Listeners may swap the writer or renderer before anything is loaded.
pub struct StartEvent<'a> {
    pub source: &'a mut Box<dyn DataSource>,
    pub writer: &'a mut Box<dyn DataWriter>,
    pub converter: &'a mut Box<dyn ItemConverter>,
    pub generators: &'a mut GeneratorManager,
    pub renderer: &'a mut Box<dyn Renderizer>,
    pub attributes: &'a mut AttributeBag,
}

/// Payload of the convert and render hooks: one item plus the content and
/// path snapshots relevant at that point.
pub struct ContentEvent<'a> {
    item: &'a mut Item,
    snapshot: Snapshot,
    path_snapshot: PathSnapshot,
}

impl<'a> ContentEvent<'a> {
    pub fn new(item: &'a mut Item, snapshot: Snapshot, path_snapshot: PathSnapshot) -> Self {
        Self {
            item,
            snapshot,
            path_snapshot,
        }
    }

    pub fn item(&self) -> &Item {
        &*self.item
    }

    pub fn item_mut(&mut self) -> &mut Item {
        &mut *self.item
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
    }

    pub fn path_snapshot(&self) -> PathSnapshot {
        self.path_snapshot
    }

    /// Content at this event's snapshot, falling back to the latest.
    pub fn content(&self) -> &str {
        self.item
            .content_at(self.snapshot)
            .unwrap_or_else(|| self.item.content())
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.item.set_content(content, self.snapshot);
    }

    pub fn path(&self) -> &str {
        self.item.path(self.path_snapshot).unwrap_or_default()
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.item.set_path(path, self.path_snapshot);
    }
}

/// Payload of `finish`: the final item set and site attributes.
pub struct FinishEvent<'a> {
    pub items: &'a [Item],
    pub site: &'a AttributeBag,
}

/// An event together with its payload.
pub enum Event<'a> {
    Start(StartEvent<'a>),
    BeforeConvert(ContentEvent<'a>),
    AfterConvert(ContentEvent<'a>),
    BeforeRenderBlocks(ContentEvent<'a>),
    AfterRenderBlocks(ContentEvent<'a>),
    BeforeRenderPage(ContentEvent<'a>),
    AfterRenderPage(ContentEvent<'a>),
    Finish(FinishEvent<'a>),
}

impl<'a> Event<'a> {
    pub fn hook_point(&self) -> HookPoint {
        match self {
            Self::Start(_) => HookPoint::Start,
            Self::BeforeConvert(_) => HookPoint::BeforeConvert,
            Self::AfterConvert(_) => HookPoint::AfterConvert,
            Self::BeforeRenderBlocks(_) => HookPoint::BeforeRenderBlocks,
            Self::AfterRenderBlocks(_) => HookPoint::AfterRenderBlocks,
            Self::BeforeRenderPage(_) => HookPoint::BeforeRenderPage,
            Self::AfterRenderPage(_) => HookPoint::AfterRenderPage,
            Self::Finish(_) => HookPoint::Finish,
        }
    }

    pub fn as_start_mut(&mut self) -> Option<&mut StartEvent<'a>> {
        match self {
            Self::Start(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_content_mut(&mut self) -> Option<&mut ContentEvent<'a>> {
        match self {
            Self::BeforeConvert(event)
            | Self::AfterConvert(event)
            | Self::BeforeRenderBlocks(event)
            | Self::AfterRenderBlocks(event)
            | Self::BeforeRenderPage(event)
            | Self::AfterRenderPage(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_finish(&self) -> Option<&FinishEvent<'a>> {
        match self {
            Self::Finish(event) => Some(event),
            _ => None,
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

type Listener = Box<dyn FnMut(&mut Event<'_>) -> Result<()>>;

/// Registry mapping hook points to ordered listeners.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: FxHashMap<HookPoint, Vec<Listener>>,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for hook in HookPoint::ALL {
            map.entry(&hook.name(), &self.listener_count(hook));
        }
        map.finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `hook`, after any already registered.
    pub fn listen<F>(&mut self, hook: HookPoint, listener: F)
    where
        F: FnMut(&mut Event<'_>) -> Result<()> + 'static,
    {
        self.listeners
            .entry(hook)
            .or_default()
            .push(Box::new(listener));
    }

    pub fn listener_count(&self, hook: HookPoint) -> usize {
        self.listeners.get(&hook).map_or(0, Vec::len)
    }

    /// Run every listener of the event's hook point, stopping at the first
    /// error.
    pub fn dispatch(&mut self, event: &mut Event<'_>) -> Result<()> {
        if let Some(listeners) = self.listeners.get_mut(&event.hook_point()) {
            for listener in listeners.iter_mut() {
                listener(&mut *event)?;
            }
        }
        Ok(())
    }

    /// Remove all listeners.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

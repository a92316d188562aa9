//! Content items and their per-phase snapshots.
//!
//! An item carries several content buffers and several path buffers, one
//! per pipeline phase. Later phases read the latest buffer written.
//!
//! ```text
//! content:  Raw ──► AfterConvert ──► AfterRenderBlocks ──► AfterRenderPage
//! path:     Source ──► Relative ──► RelativeAfterConvert ──► Permalink
//! ```
//!
//! A blank `Relative` path marks the item as excluded from output; the
//! item itself stays in the store.

use crate::attributes::AttributeBag;
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Snapshots
// ============================================================================

/// Named content buffer, in phase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Snapshot {
    Raw,
    AfterConvert,
    AfterRenderBlocks,
    AfterRenderPage,
}

impl Snapshot {
    pub const ALL: [Self; 4] = [
        Self::Raw,
        Self::AfterConvert,
        Self::AfterRenderBlocks,
        Self::AfterRenderPage,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::AfterConvert => "after_convert",
            Self::AfterRenderBlocks => "after_render_blocks",
            Self::AfterRenderPage => "after_render_page",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Named path buffer, in phase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSnapshot {
    Source,
    Relative,
    RelativeAfterConvert,
    Permalink,
}

impl PathSnapshot {
    pub const ALL: [Self; 4] = [
        Self::Source,
        Self::Relative,
        Self::RelativeAfterConvert,
        Self::Permalink,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Relative => "relative",
            Self::RelativeAfterConvert => "relative_after_convert",
            Self::Permalink => "permalink",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// Relationships
// ============================================================================

/// Named links from an item to other items, by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    links: BTreeMap<String, Vec<String>>,
}

impl Relationships {
    /// Append `id` under `name`, ignoring duplicates.
    pub fn add(&mut self, name: &str, id: &str) {
        let ids = self.links.entry(name.to_owned()).or_default();
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_owned());
        }
    }

    pub fn get(&self, name: &str) -> &[String] {
        self.links.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// First id linked under `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).first().map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.links.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.links.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Projection used by the site attributes (`page.relationships`).
    pub fn to_value(&self) -> Value {
        self.links
            .iter()
            .map(|(name, ids)| (name.clone(), Value::from(ids.clone())))
            .collect::<serde_json::Map<_, _>>()
            .into()
    }
}

// ============================================================================
// Item
// ============================================================================

/// A unit of content flowing through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: String,
    attributes: AttributeBag,
    content: [Option<String>; 4],
    paths: [Option<String>; 4],
    collection: Option<String>,
    binary: bool,
    relationships: Relationships,
}

impl Item {
    /// Create a text item whose source and relative paths are both `path`.
    pub fn new(id: impl Into<String>, content: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let mut item = Self {
            id: id.into(),
            attributes: AttributeBag::new(),
            content: Default::default(),
            paths: Default::default(),
            collection: None,
            binary: false,
            relationships: Relationships::default(),
        };
        item.set_content(content, Snapshot::Raw);
        item.set_path(path.clone(), PathSnapshot::Source);
        item.set_path(path, PathSnapshot::Relative);
        item
    }

    /// Create a binary item; it skips conversion and rendering.
    pub fn binary(id: impl Into<String>, path: impl Into<String>) -> Self {
        let mut item = Self::new(id, "", path);
        item.binary = true;
        item
    }

    pub fn with_attributes(mut self, attributes: AttributeBag) -> Self {
        self.attributes = attributes;
        self
    }

    /// Override the source path (e.g. an absolute file path).
    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.set_path(path, PathSnapshot::Source);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeBag {
        &mut self.attributes
    }

    pub fn set_attributes(&mut self, attributes: AttributeBag) {
        self.attributes = attributes;
    }

    /// Latest content written, or `""` if none.
    pub fn content(&self) -> &str {
        self.content
            .iter()
            .rev()
            .find_map(Option::as_deref)
            .unwrap_or_default()
    }

    pub fn content_at(&self, snapshot: Snapshot) -> Option<&str> {
        self.content[snapshot.index()].as_deref()
    }

    pub fn set_content(&mut self, content: impl Into<String>, snapshot: Snapshot) {
        self.content[snapshot.index()] = Some(content.into());
    }

    pub fn path(&self, snapshot: PathSnapshot) -> Option<&str> {
        self.paths[snapshot.index()].as_deref()
    }

    /// Latest path written, or `""` if none.
    pub fn latest_path(&self) -> &str {
        self.paths
            .iter()
            .rev()
            .find_map(Option::as_deref)
            .unwrap_or_default()
    }

    pub fn set_path(&mut self, path: impl Into<String>, snapshot: PathSnapshot) {
        self.paths[snapshot.index()] = Some(path.into());
    }

    /// Relative source path used in error messages.
    pub fn relative_path(&self) -> &str {
        self.path(PathSnapshot::Relative).unwrap_or_default()
    }

    /// Whether the item has been excluded from conversion, render and write.
    pub fn is_excluded(&self) -> bool {
        self.path(PathSnapshot::Relative).is_some_and(str::is_empty)
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn set_collection(&mut self, name: impl Into<String>) {
        self.collection = Some(name.into());
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    pub fn relationships_mut(&mut self) -> &mut Relationships {
        &mut self.relationships
    }
}

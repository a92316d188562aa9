//! Item sources.
//!
//! A data source supplies the content items, layouts and includes of a
//! site. Discovery (walking directories, parsing front matter) belongs to
//! the source; the pipeline only consumes what it returns.

use crate::item::Item;
use anyhow::Result;
use std::collections::BTreeMap;

/// Supplier of items, layouts and includes.
pub trait DataSource {
    /// Discover and load everything. Called once per build.
    fn load(&mut self) -> Result<()>;

    /// Content items, in discovery order.
    fn items(&self) -> Vec<Item>;

    /// Layouts keyed by id.
    fn layouts(&self) -> BTreeMap<String, Item>;

    /// Includes keyed by id.
    fn includes(&self) -> BTreeMap<String, Item>;
}

/// Source whose items are supplied directly in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    items: Vec<Item>,
    layouts: BTreeMap<String, Item>,
    includes: BTreeMap<String, Item>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn add_layout(&mut self, layout: Item) {
        self.layouts.insert(layout.id().to_owned(), layout);
    }

    pub fn add_include(&mut self, include: Item) {
        self.includes.insert(include.id().to_owned(), include);
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.add_item(item);
        self
    }

    pub fn with_layout(mut self, layout: Item) -> Self {
        self.add_layout(layout);
        self
    }

    pub fn with_include(mut self, include: Item) -> Self {
        self.add_include(include);
        self
    }
}

impl DataSource for MemorySource {
    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    fn items(&self) -> Vec<Item> {
        self.items.clone()
    }

    fn layouts(&self) -> BTreeMap<String, Item> {
        self.layouts.clone()
    }

    fn includes(&self) -> BTreeMap<String, Item> {
        self.includes.clone()
    }
}

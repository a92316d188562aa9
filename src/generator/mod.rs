//! Procedural item generators.
//!
//! An item carrying a `generator` attribute is not rendered itself: the
//! named generator receives it together with the items accumulated so far
//! and returns derived items (pagination pages, archives, ...).
//!
//! Generators never see the store directly. Id collisions between their
//! output and existing items are detected by the pipeline on insertion.

mod pagination;

pub use pagination::PaginationGenerator;

use crate::error::BuildError;
use crate::item::Item;
use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;

/// Producer of derived items.
pub trait Generator {
    /// Build new items from `trigger`, with read access to `items`.
    fn generate(&mut self, trigger: &Item, items: &[Item]) -> Result<Vec<Item>>;
}

/// Registry of generators by name.
pub struct GeneratorManager {
    generators: BTreeMap<String, Box<dyn Generator>>,
}

impl Default for GeneratorManager {
    /// Registry with the built-in `pagination` generator.
    fn default() -> Self {
        let mut manager = Self::empty();
        manager.add("pagination", PaginationGenerator::new());
        manager
    }
}

impl fmt::Debug for GeneratorManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.generators.keys()).finish()
    }
}

impl GeneratorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry without built-ins.
    pub fn empty() -> Self {
        Self {
            generators: BTreeMap::new(),
        }
    }

    /// Register `generator` under `name`, replacing any previous one.
    pub fn add(&mut self, name: impl Into<String>, generator: impl Generator + 'static) {
        self.generators.insert(name.into(), Box::new(generator));
    }

    pub fn has(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.generators.remove(name).is_some()
    }

    /// Look up a generator; an unknown name is a configuration error.
    pub fn get(&mut self, name: &str) -> Result<&mut dyn Generator, BuildError> {
        match self.generators.get_mut(name) {
            Some(generator) => Ok(generator.as_mut()),
            None => Err(BuildError::Configuration(format!(
                "Generator `{name}` not found"
            ))),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }
}

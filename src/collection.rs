//! Collections: named groups of items sharing default attributes.
//!
//! Every item belongs to exactly one collection. The owning collection is
//! the configured one whose path is the longest prefix of the item's
//! relative path; anything unclaimed falls into the implicit `pages`
//! collection.
//!
//! | Relative path | Collections | Owner |
//! |---------------|-------------|-------|
//! | `posts/hello.md` | `posts` (path `posts`) | `posts` |
//! | `posts/2024/a.md` | `posts`, `archive` (path `posts/2024`) | `archive` |
//! | `about.md` | `posts` | `pages` |

use crate::attributes::AttributeBag;
use crate::item::{Item, PathSnapshot};

/// Name of the catch-all collection.
pub const DEFAULT_COLLECTION: &str = "pages";

/// A named grouping of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    name: String,
    path: String,
    attributes: AttributeBag,
}

impl Collection {
    pub fn new(name: impl Into<String>, path: impl Into<String>, attributes: AttributeBag) -> Self {
        let path: String = path.into();
        Self {
            name: name.into(),
            path: path.trim_matches('/').to_owned(),
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base path of the collection, without surrounding slashes.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    /// Whether `relative` lives under this collection's path.
    fn claims(&self, relative: &str) -> bool {
        !self.path.is_empty()
            && relative
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Attributes exposed as `site.collections.<name>`: the collection's
    /// own attributes plus its base path.
    pub fn site_projection(&self) -> AttributeBag {
        let mut projection = self.attributes.clone();
        projection.set("path", self.path.clone());
        projection
    }
}

/// Registry of collections, always containing the default one.
#[derive(Debug, Clone)]
pub struct CollectionManager {
    collections: Vec<Collection>,
}

impl Default for CollectionManager {
    fn default() -> Self {
        Self {
            collections: vec![Collection::new(DEFAULT_COLLECTION, "", AttributeBag::new())],
        }
    }
}

impl CollectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection, replacing one with the same name.
    pub fn add(&mut self, collection: Collection) {
        match self
            .collections
            .iter_mut()
            .find(|c| c.name == collection.name)
        {
            Some(existing) => *existing = collection,
            None => self.collections.push(collection),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// All collections in registration order (`pages` first).
    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Resolve the collection owning `item`.
    pub fn collection_for(&self, item: &Item) -> &Collection {
        let relative = item.path(PathSnapshot::Relative).unwrap_or_default();
        let relative = relative.trim_start_matches('/');

        self.collections
            .iter()
            .filter(|c| c.claims(relative))
            .max_by_key(|c| c.path.len())
            .or_else(|| self.get(DEFAULT_COLLECTION))
            .unwrap_or(&self.collections[0])
    }
}

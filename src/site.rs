//! Site-wide attributes exposed to templates.
//!
//! One bag per build, rooted at:
//!
//! | Key | Content |
//! |-----|---------|
//! | `site.*` | Configured site tree, build flags, collection projections |
//! | `site.pages.<id>` | Every non-excluded item visited so far |
//! | `site.<collection>.<id>` | Same, grouped by collection |
//! | `site.categories.<c>` / `site.tags.<t>` | Item ids per category / tag |
//! | `spress.*` | Engine-provided attributes |
//! | `page` | The current item |

use crate::attributes::{AttributeBag, escape_dot};
use crate::item::{Item, PathSnapshot};
use serde_json::Value;

/// Keys under `site` written by the build itself. A collection listing
/// lives at `site.<collection>`, so no collection may use one of these.
pub const RESERVED_KEYS: [&str; 6] = [
    "drafts",
    "safe",
    "timezone",
    "collections",
    "categories",
    "tags",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_KEYS.contains(&name)
}

/// Site attribute context with a "current item".
#[derive(Debug, Clone, Default)]
pub struct SiteAttributes {
    attributes: AttributeBag,
}

impl SiteAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the context, placing `site` at the `site` key.
    pub fn initialize(&mut self, site: AttributeBag) {
        self.attributes = AttributeBag::new();
        self.attributes.set("site", site.into_value());
    }

    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        self.attributes.set(path, value);
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.attributes.get(path)
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    /// Make `item` the current item and register it in the site listings.
    pub fn set_item(&mut self, item: &Item) {
        let page = Self::project(item);
        self.attributes.set("page", page.clone());

        if item.is_excluded() {
            return;
        }

        let id = escape_dot(item.id());
        self.attributes.set(&format!("site.pages.{id}"), page.clone());
        if let Some(collection) = item.collection() {
            let collection = escape_dot(collection);
            self.attributes
                .set(&format!("site.{collection}.{id}"), page);
        }

        for taxonomy in ["categories", "tags"] {
            self.index_terms(taxonomy, item);
        }
    }

    /// Item view used as `page`: its attributes plus identity and content.
    fn project(item: &Item) -> Value {
        let mut page = item.attributes().clone();
        page.set("id", item.id());
        page.set("content", item.content());
        page.set(
            "path",
            item.path(PathSnapshot::RelativeAfterConvert)
                .or_else(|| item.path(PathSnapshot::Relative))
                .unwrap_or_default(),
        );
        if let Some(collection) = item.collection() {
            page.set("collection", collection);
        }
        if !item.relationships().is_empty() {
            page.set("relationships", item.relationships().to_value());
        }
        page.into_value()
    }

    /// Append the item id to `site.<taxonomy>.<term>` for each string term.
    fn index_terms(&mut self, taxonomy: &str, item: &Item) {
        let Some(Value::Array(terms)) = item.attributes().get(taxonomy) else {
            return;
        };

        for term in terms.iter().filter_map(Value::as_str) {
            let key = format!("site.{taxonomy}.{}", escape_dot(term));
            let mut ids = match self.attributes.get(&key) {
                Some(Value::Array(ids)) => ids.clone(),
                _ => Vec::new(),
            };
            let id = Value::from(item.id());
            if !ids.contains(&id) {
                ids.push(id);
            }
            self.attributes.set(&key, ids);
        }
    }
}

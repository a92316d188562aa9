//! `[collections.<name>]` sections.
//!
//! ```toml
//! [collections.posts]
//! path = "posts"        # defaults to the collection name
//! sort_by = "date"
//! sort_type = "descending"
//! layout = "post"
//! ```
//!
//! Every key except `path` becomes a collection attribute, merged under
//! the attributes of each item in the collection.

use super::toml_to_json;
use crate::attributes::AttributeBag;
use crate::collection::Collection;
use serde::{Deserialize, Serialize};

/// One configured collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Base path relative to the source root.
    #[serde(default)]
    pub path: Option<String>,

    /// Collection attributes.
    #[serde(flatten)]
    pub attributes: toml::Table,
}

impl CollectionConfig {
    pub fn to_collection(&self, name: &str) -> Collection {
        let attributes = AttributeBag::from_value(toml_to_json(toml::Value::Table(
            self.attributes.clone(),
        )));
        Collection::new(name, self.path.as_deref().unwrap_or(name), attributes)
    }

    /// Configured `sort_type`, if it is a string.
    pub fn sort_type(&self) -> Option<&str> {
        self.attributes.get("sort_type").and_then(toml::Value::as_str)
    }
}

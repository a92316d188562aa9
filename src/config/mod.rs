//! Site configuration management for `spress.toml`.
//!
//! # Sections
//!
//! | Section              | Purpose                                    |
//! |----------------------|--------------------------------------------|
//! | `[build]`            | Drafts, safe mode, time zone, permalinks   |
//! | `[site]`             | Free-form attributes exposed as `site.*`   |
//! | `[collections.<n>]`  | Collection path and default attributes     |
//!
//! # Example
//!
//! ```toml
//! [build]
//! timezone = "Europe/Madrid"
//!
//! [site]
//! title = "My Blog"
//! url = "https://example.com"
//!
//! [collections.posts]
//! sort_by = "date"
//! layout = "post"
//! ```

mod build;
mod collections;
pub mod defaults;
mod error;

pub use build::BuildConfig;
pub use collections::CollectionConfig;
pub use error::ConfigError;

use crate::attributes::AttributeBag;
use crate::collection::CollectionManager;
use crate::site;
use anyhow::{Result, bail};
use chrono_tz::Tz;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a TOML value into an attribute value.
///
/// Datetimes become their RFC 3339 text.
pub(crate) fn toml_to_json(value: toml::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing spress.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Site attributes
    #[serde(default)]
    pub site: toml::Table,

    /// Configured collections by name
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionConfig>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Validate values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        let timezone = self.build.timezone.trim();
        if timezone.is_empty() {
            bail!(ConfigError::Validation("[build.timezone] must not be empty".into()));
        }
        if timezone.parse::<Tz>().is_err() {
            bail!(ConfigError::Validation(format!(
                "[build.timezone] `{timezone}` is not a known time zone"
            )));
        }

        if self.build.permalink.trim().is_empty() {
            bail!(ConfigError::Validation("[build.permalink] must not be empty".into()));
        }

        for (name, collection) in &self.collections {
            if site::is_reserved(name) {
                bail!(ConfigError::Validation(format!(
                    "[collections.{name}] uses a name reserved for site attributes"
                )));
            }
            if let Some(sort_type) = collection.sort_type()
                && !matches!(sort_type, "ascending" | "descending")
            {
                bail!(ConfigError::Validation(format!(
                    "[collections.{name}.sort_type] must be `ascending` or `descending`"
                )));
            }
        }

        Ok(())
    }

    /// `[site]` as an attribute bag.
    pub fn site_attributes(&self) -> AttributeBag {
        AttributeBag::from_value(toml_to_json(toml::Value::Table(self.site.clone())))
    }

    /// Collection registry with the configured collections.
    pub fn collection_manager(&self) -> CollectionManager {
        let mut manager = CollectionManager::new();
        for (name, collection) in &self.collections {
            manager.add(collection.to_collection(name));
        }
        manager
    }
}

// ============================================================================
// Tests
// ============================================================================

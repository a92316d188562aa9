//! `[build]` section configuration.
//!
//! Flags that change how one build runs: drafts, safe mode, time zone,
//! permalink style and output directory.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in spress.toml.
///
/// # Example
/// ```toml
/// [build]
/// drafts = false             # Publish posts marked `draft = true`
/// safe = false               # Skip plugins
/// timezone = "Europe/Madrid" # Zone used to read item dates
/// permalink = "pretty"       # none | pretty | date | custom template
/// output = "build"           # File-system writer destination
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Include drafts of the `posts` collection.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub drafts: bool,

    /// Safe mode: plugins are neither initialized nor torn down.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub safe: bool,

    /// IANA time zone name.
    #[serde(default = "defaults::build::timezone")]
    #[educe(Default = defaults::build::timezone())]
    pub timezone: String,

    /// Default permalink style.
    #[serde(default = "defaults::build::permalink")]
    #[educe(Default = defaults::build::permalink())]
    pub permalink: String,

    /// Output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Empty the output directory before writing.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,
}

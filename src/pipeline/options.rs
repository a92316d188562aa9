//! Per-build options.

use crate::attributes::AttributeBag;
use crate::config::SiteConfig;
use educe::Educe;

/// Inputs of a single build.
#[derive(Debug, Clone, Educe)]
#[educe(Default)]
pub struct BuildOptions {
    /// Tree placed under `site`.
    pub site: AttributeBag,

    /// Engine attributes placed under `spress`.
    #[educe(Default = default_spress())]
    pub spress: AttributeBag,

    /// Publish drafts of the `posts` collection.
    pub drafts: bool,

    /// Skip plugins.
    pub safe: bool,

    /// IANA time zone name used for date handling.
    #[educe(Default = String::from("UTC"))]
    pub timezone: String,
}

fn default_spress() -> AttributeBag {
    let mut spress = AttributeBag::new();
    spress.set("version", env!("CARGO_PKG_VERSION"));
    spress
}

impl BuildOptions {
    /// Options for a build of `config`.
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            site: config.site_attributes(),
            drafts: config.build.drafts,
            safe: config.build.safe,
            timezone: config.build.timezone.clone(),
            ..Self::default()
        }
    }

    pub fn with_drafts(mut self, drafts: bool) -> Self {
        self.drafts = drafts;
        self
    }

    pub fn with_safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_site(mut self, site: AttributeBag) -> Self {
        self.site = site;
        self
    }
}

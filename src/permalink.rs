//! Permalink resolution.
//!
//! Each item gets a final output path (relative to the output directory)
//! and a public URL. The style comes from the item's `permalink` attribute
//! or, failing that, the configured default:
//!
//! | Style | Template |
//! |-------|----------|
//! | `none` | `/:path/:basename.:extension` |
//! | `pretty` | `/:path/:basename/` for html, `none` otherwise |
//! | `date` | `/:collection/:year/:month/:day/:title.:extension` |
//! | anything else | used as a template |
//!
//! # Placeholders
//!
//! | Placeholder | Value for `posts/2024/Hello World.html` |
//! |-------------|------------------------------------------|
//! | `:path` | `posts/2024` |
//! | `:basename` | `Hello World` |
//! | `:extension` | `html` |
//! | `:collection` | item collection |
//! | `:title` | slug of the `title` attribute (or basename) |
//! | `:year` `:month` `:day` | from `date`, in the build time zone |
//!
//! A URL ending in `/` is written as `<url>/index.html`.

use crate::item::{Item, PathSnapshot};
use crate::utils::date::parse_date;
use crate::utils::slug::{normalize_url_path, slugify};
use anyhow::{Result, bail};
use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use std::path::Path;

const NONE_TEMPLATE: &str = "/:path/:basename.:extension";
const PRETTY_TEMPLATE: &str = "/:path/:basename/";
const PRETTY_INDEX_TEMPLATE: &str = "/:path/";
const DATE_TEMPLATE: &str = "/:collection/:year/:month/:day/:title.:extension";

/// Resolved output location of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permalink {
    /// Output path relative to the output directory. Blank when excluded.
    pub path: String,
    /// Public URL path. Blank when excluded.
    pub url: String,
}

impl Permalink {
    pub fn blank() -> Self {
        Self::default()
    }

    /// Build from a URL path, deriving the file path.
    fn from_url(url: String) -> Self {
        let file = if url.ends_with('/') {
            format!("{url}index.html")
        } else {
            url.clone()
        };
        Self {
            path: file.trim_start_matches('/').to_owned(),
            url,
        }
    }
}

/// Permalink driver contract consumed by the pipeline.
pub trait PermalinkResolver {
    /// Resolve `item`'s permalink; dates are read in `tz`.
    fn resolve(&mut self, item: &Item, tz: Tz) -> Result<Permalink>;
}

/// Default resolver supporting the built-in styles and custom templates.
#[derive(Debug, Clone)]
pub struct PermalinkGenerator {
    default_style: String,
}

impl Default for PermalinkGenerator {
    fn default() -> Self {
        Self::new("pretty")
    }
}

impl PermalinkGenerator {
    pub fn new(default_style: impl Into<String>) -> Self {
        Self {
            default_style: default_style.into(),
        }
    }

    pub fn default_style(&self) -> &str {
        &self.default_style
    }

    fn template_for<'a>(style: &'a str, parts: &PathParts) -> &'a str {
        match style {
            "none" => NONE_TEMPLATE,
            "pretty" if parts.extension == "html" && parts.basename == "index" => {
                PRETTY_INDEX_TEMPLATE
            }
            "pretty" if parts.extension == "html" => PRETTY_TEMPLATE,
            "pretty" => NONE_TEMPLATE,
            "date" => DATE_TEMPLATE,
            custom => custom,
        }
    }
}

impl PermalinkResolver for PermalinkGenerator {
    fn resolve(&mut self, item: &Item, tz: Tz) -> Result<Permalink> {
        if item.is_excluded() {
            return Ok(Permalink::blank());
        }

        let relative = item
            .path(PathSnapshot::RelativeAfterConvert)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| item.relative_path());
        let parts = PathParts::new(relative);

        if item.is_binary() {
            return Ok(Permalink::from_url(normalize_url_path(relative)));
        }

        let style = match item.attributes().get("permalink") {
            None => self.default_style.as_str(),
            Some(value) => match value.as_str() {
                Some(style) => style,
                None => bail!("Attribute `permalink` must be a string in `{relative}`"),
            },
        };
        let template = Self::template_for(style, &parts);

        let url = expand(template, item, &parts, tz)?;
        Ok(Permalink::from_url(normalize_url_path(&url)))
    }
}

/// Path pieces of an item's relative path.
struct PathParts {
    dir: String,
    basename: String,
    extension: String,
}

impl PathParts {
    fn new(relative: &str) -> Self {
        let path = Path::new(relative);
        let lossy = |s: Option<&std::ffi::OsStr>| {
            s.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
        };
        Self {
            dir: path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            basename: lossy(path.file_stem()),
            extension: lossy(path.extension()),
        }
    }
}

fn expand(template: &str, item: &Item, parts: &PathParts, tz: Tz) -> Result<String> {
    let title = item
        .attributes()
        .get_str("title")
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&parts.basename));

    let mut url = template
        .replace(":path", &parts.dir)
        .replace(":basename", &parts.basename)
        .replace(":extension", &parts.extension)
        .replace(":collection", item.collection().unwrap_or_default())
        .replace(":title", &title);

    if url.contains(":year") || url.contains(":month") || url.contains(":day") {
        let Some(date) = item_date(item, tz) else {
            bail!(
                "Permalink `{template}` needs a valid `date` attribute in `{}`",
                item.relative_path()
            );
        };
        url = url
            .replace(":year", &format!("{:04}", date.year()))
            .replace(":month", &format!("{:02}", date.month()))
            .replace(":day", &format!("{:02}", date.day()));
    }

    // `/:path/:basename.:extension` on an extensionless file
    if parts.extension.is_empty() {
        url = url.trim_end_matches('.').to_owned();
    }
    Ok(url)
}

fn item_date(item: &Item, tz: Tz) -> Option<DateTime<Tz>> {
    item.attributes().get("date").and_then(|v| parse_date(v, tz))
}

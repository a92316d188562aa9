//! Pagination over a collection.
//!
//! # Attributes (on the triggering item)
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `max_page` | `5` | Items per page |
//! | `provider` | `site.posts` | Collection to paginate |
//! | `permalink` | `/page:num` | Path of pages after the first |
//! | `sort_by` | - | Attribute to order items by (provider order if unset) |
//! | `sort_type` | `descending` | `ascending` or `descending` |
//!
//! Page 1 keeps the trigger's id and path. Page N lives in
//! `<trigger dir>/<permalink, :num = N>/index.html`:
//!
//! | Trigger | Page | Path |
//! |---------|------|------|
//! | `blog/index.html` | 1 | `blog/index.html` |
//! | `blog/index.html` | 2 | `blog/page2/index.html` |
//! | `index.html` | 3 | `page3/index.html` |

use super::Generator;
use crate::attributes::compare_values;
use crate::item::{Item, PathSnapshot, Snapshot};
use anyhow::{Result, bail};
use serde::Serialize;
use std::path::Path;

const DEFAULT_MAX_PAGE: u64 = 5;
const DEFAULT_PROVIDER: &str = "site.posts";
const DEFAULT_PERMALINK: &str = "/page:num";

/// Splits a collection into pages of `max_page` items.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationGenerator;

/// Value stored under each page's `paginator` attribute.
#[derive(Debug, Clone, Serialize)]
struct Paginator {
    items: Vec<String>,
    total_items: usize,
    total_pages: usize,
    items_per_page: usize,
    current_page: usize,
    previous_page: Option<usize>,
    next_page: Option<usize>,
    previous_page_path: Option<String>,
    next_page_path: Option<String>,
}

impl PaginationGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for PaginationGenerator {
    fn generate(&mut self, trigger: &Item, items: &[Item]) -> Result<Vec<Item>> {
        let options = Options::from_item(trigger)?;
        let ids = options.provided_ids(items);

        let total_items = ids.len();
        let total_pages = total_items.div_ceil(options.max_page).max(1);

        let relative = trigger.relative_path();
        let paths: Vec<String> = (1..=total_pages)
            .map(|page| page_path(relative, &options.permalink, page))
            .collect();

        let mut pages = Vec::with_capacity(total_pages);
        for (index, chunk) in chunk_ids(&ids, options.max_page, total_pages)
            .into_iter()
            .enumerate()
        {
            let current = index + 1;
            let paginator = Paginator {
                items: chunk,
                total_items,
                total_pages,
                items_per_page: options.max_page,
                current_page: current,
                previous_page: (current > 1).then(|| current - 1),
                next_page: (current < total_pages).then(|| current + 1),
                previous_page_path: (current > 1).then(|| page_url(&paths[index - 1])),
                next_page_path: (current < total_pages).then(|| page_url(&paths[index + 1])),
            };

            let id = if current == 1 {
                trigger.id().to_owned()
            } else {
                paths[index].clone()
            };
            pages.push(build_page(trigger, id, &paths[index], paginator)?);
        }

        Ok(pages)
    }
}

/// Options read from the triggering item.
struct Options {
    max_page: usize,
    collection: String,
    permalink: String,
    sort_by: Option<String>,
    descending: bool,
}

impl Options {
    fn from_item(item: &Item) -> Result<Self> {
        let attrs = item.attributes();
        let path = item.relative_path();

        let max_page = match attrs.get("max_page") {
            None => DEFAULT_MAX_PAGE,
            Some(value) => match value.as_u64() {
                Some(n) if n > 0 => n,
                _ => bail!("Pagination `max_page` must be a positive integer in `{path}`"),
            },
        };

        let provider = attrs.get_str("provider").unwrap_or(DEFAULT_PROVIDER);
        let collection = provider.strip_prefix("site.").unwrap_or(provider);
        if collection.is_empty() {
            bail!("Pagination `provider` is empty in `{path}`");
        }

        let descending = match attrs.get_str("sort_type") {
            None | Some("descending") => true,
            Some("ascending") => false,
            Some(other) => bail!(
                "Pagination `sort_type` must be `ascending` or `descending`, got `{other}` in `{path}`"
            ),
        };

        Ok(Self {
            max_page: usize::try_from(max_page)?,
            collection: collection.to_owned(),
            permalink: attrs
                .get_str("permalink")
                .unwrap_or(DEFAULT_PERMALINK)
                .to_owned(),
            sort_by: attrs.get_str("sort_by").map(str::to_owned),
            descending,
        })
    }

    /// Ids of the provider collection, ordered per `sort_by`.
    fn provided_ids(&self, items: &[Item]) -> Vec<String> {
        let mut provided: Vec<&Item> = items
            .iter()
            .filter(|item| item.collection() == Some(self.collection.as_str()))
            .collect();

        if let Some(key) = &self.sort_by {
            provided.sort_by(|a, b| {
                let ordering = compare_values(a.attributes().get(key), b.attributes().get(key));
                if self.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        provided.iter().map(|item| item.id().to_owned()).collect()
    }
}

/// Split `ids` into `total_pages` chunks; an empty input still yields one.
fn chunk_ids(ids: &[String], per_page: usize, total_pages: usize) -> Vec<Vec<String>> {
    let mut chunks: Vec<Vec<String>> = ids.chunks(per_page).map(<[String]>::to_vec).collect();
    chunks.resize(total_pages, Vec::new());
    chunks
}

/// Relative path of page `page` for a trigger at `relative`.
fn page_path(relative: &str, permalink: &str, page: usize) -> String {
    if page == 1 {
        return relative.to_owned();
    }

    let dir = Path::new(relative)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let segment = permalink.replace(":num", &page.to_string());
    let segment = segment.trim_matches('/');

    let path = if dir.is_empty() {
        format!("{segment}/index.html")
    } else {
        format!("{dir}/{segment}/index.html")
    };
    path.trim_start_matches('/').to_owned()
}

/// Site-root URL of a page path; `index.html` maps to its directory.
fn page_url(path: &str) -> String {
    match path.strip_suffix("index.html") {
        Some(dir) => format!("/{}", dir.trim_start_matches('/')),
        None => format!("/{}", path.trim_start_matches('/')),
    }
}

fn build_page(trigger: &Item, id: String, path: &str, paginator: Paginator) -> Result<Item> {
    let mut attributes = trigger.attributes().clone();
    attributes.remove("generator");
    // `permalink` here is the page pattern, not the page's own permalink.
    attributes.remove("permalink");
    attributes.set("paginator", serde_json::to_value(paginator)?);

    let content = trigger.content_at(Snapshot::Raw).unwrap_or_default();
    let source = trigger.path(PathSnapshot::Source).unwrap_or_default();
    Ok(Item::new(id, content, path)
        .with_attributes(attributes)
        .with_source_path(source))
}

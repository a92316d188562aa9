//! Template rendering.
//!
//! The pipeline drives a [`Renderizer`] in two passes: blocks (the item's
//! own content) and page (content wrapped in its layout chain).
//! [`LayoutRenderizer`] is a deliberately small engine:
//!
//! - `{{ site.title }}` is replaced by the attribute at that dotted path
//!   (strings verbatim, scalars formatted, lists and maps as JSON, missing
//!   values as nothing)
//! - `{% include nav %}` inserts the include registered as `nav`
//! - a layout may name its own `layout`, forming a chain; each step sees
//!   the wrapped content as `page.content`

use crate::attributes::AttributeBag;
use anyhow::{Result, bail};
use regex::{Captures, Regex};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use std::sync::OnceLock;

/// Maximum include nesting before giving up.
const MAX_INCLUDE_DEPTH: usize = 16;

/// Render collaborator contract consumed by the pipeline.
pub trait Renderizer {
    fn add_layout(&mut self, id: &str, content: &str, attributes: &AttributeBag);

    fn add_include(&mut self, id: &str, content: &str, attributes: &AttributeBag);

    /// Render an item's own content against `attributes`.
    fn render_blocks(
        &mut self,
        id: &str,
        content: &str,
        attributes: &AttributeBag,
    ) -> Result<String>;

    /// Wrap already rendered `content` in `layout` (if any).
    fn render_page(
        &mut self,
        id: &str,
        content: &str,
        layout: Option<&str>,
        attributes: &AttributeBag,
    ) -> Result<String>;

    /// Forget all layouts and includes.
    fn clear(&mut self);
}

#[derive(Debug, Clone)]
struct Template {
    content: String,
    attributes: AttributeBag,
}

/// Default renderer with placeholder substitution and layout chains.
#[derive(Debug, Clone, Default)]
pub struct LayoutRenderizer {
    layouts: FxHashMap<String, Template>,
    includes: FxHashMap<String, Template>,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([\w\-\.\[\]]+)\s*\}\}").unwrap())
}

fn include_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{%\s*include\s+([^\s%]+)\s*%\}").unwrap())
}

impl LayoutRenderizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_layout(&self, id: &str) -> bool {
        self.layouts.contains_key(id)
    }

    pub fn has_include(&self, id: &str) -> bool {
        self.includes.contains_key(id)
    }

    /// Expand includes then placeholders in `template`.
    fn render_template(&self, name: &str, template: &str, context: &AttributeBag) -> Result<String> {
        let expanded = self.expand_includes(name, template, 0)?;
        let rendered = placeholder_re().replace_all(&expanded, |caps: &Captures<'_>| {
            context.get(&caps[1]).map(display_value).unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }

    fn expand_includes(&self, name: &str, template: &str, depth: usize) -> Result<String> {
        if !include_re().is_match(template) {
            return Ok(template.to_owned());
        }
        if depth >= MAX_INCLUDE_DEPTH {
            bail!("Includes nested too deeply while rendering `{name}`");
        }

        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in include_re().captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            let id = &caps[1];
            let Some(include) = self.includes.get(id) else {
                bail!("Include `{id}` not found while rendering `{name}`");
            };

            out.push_str(&template[last..whole.start()]);
            out.push_str(&self.expand_includes(name, &include.content, depth + 1)?);
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}

/// Text form of an attribute value inside a template.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Renderizer for LayoutRenderizer {
    fn add_layout(&mut self, id: &str, content: &str, attributes: &AttributeBag) {
        self.layouts.insert(
            id.to_owned(),
            Template {
                content: content.to_owned(),
                attributes: attributes.clone(),
            },
        );
    }

    fn add_include(&mut self, id: &str, content: &str, attributes: &AttributeBag) {
        self.includes.insert(
            id.to_owned(),
            Template {
                content: content.to_owned(),
                attributes: attributes.clone(),
            },
        );
    }

    fn render_blocks(
        &mut self,
        id: &str,
        content: &str,
        attributes: &AttributeBag,
    ) -> Result<String> {
        self.render_template(id, content, attributes)
    }

    fn render_page(
        &mut self,
        id: &str,
        content: &str,
        layout: Option<&str>,
        attributes: &AttributeBag,
    ) -> Result<String> {
        let mut rendered = content.to_owned();
        let mut next = layout.filter(|l| !l.is_empty()).map(str::to_owned);
        let mut seen = FxHashSet::default();

        while let Some(layout_id) = next.take() {
            if !seen.insert(layout_id.clone()) {
                bail!("Layout cycle through `{layout_id}` while rendering `{id}`");
            }
            let Some(layout) = self.layouts.get(&layout_id) else {
                bail!("Layout `{layout_id}` not found while rendering `{id}`");
            };

            let mut context = attributes.clone();
            context.set("page.content", rendered);
            context.set("layout", layout.attributes.clone());
            rendered = self.render_template(id, &layout.content, &context)?;

            next = layout
                .attributes
                .get_str("layout")
                .filter(|l| !l.is_empty())
                .map(str::to_owned);
        }

        Ok(rendered)
    }

    fn clear(&mut self) {
        self.layouts.clear();
        self.includes.clear();
    }
}

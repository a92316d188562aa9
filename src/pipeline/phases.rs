//! The phases of a build, in execution order.

use super::{BuildOptions, Phase, Pipeline, validate};
use crate::{
    attributes::{AttributeBag, compare_values, escape_dot},
    collection::CollectionManager,
    error::BuildError,
    events::{ContentEvent, Event, FinishEvent, StartEvent},
    item::{Item, PathSnapshot, Snapshot},
    log,
    site::{self, SiteAttributes},
    store::{DuplicateId, ItemStore},
    vlog, vvlog,
};
use chrono_tz::Tz;
use serde_json::Value;

/// Collection whose items honor `draft`.
const POSTS_COLLECTION: &str = "posts";

impl Pipeline {
    // ========================================================================
    // Reset → Setup → PluginInit
    // ========================================================================

    pub(super) fn reset(&mut self) {
        self.enter(Phase::Reset);
        self.store.clear();
        self.site = SiteAttributes::new();
        self.layouts.clear();
        self.includes.clear();
        self.hooks.plugins.clear();
    }

    /// Validate and apply the build time zone.
    pub(super) fn setup(&mut self, options: &BuildOptions) -> Result<(), BuildError> {
        self.enter(Phase::Setup);

        let name = options.timezone.trim();
        if name.is_empty() {
            return Err(BuildError::Configuration(
                "The time zone must not be empty".into(),
            ));
        }
        self.timezone = name
            .parse::<Tz>()
            .map_err(|_| BuildError::Configuration(format!("Invalid time zone `{name}`")))?;

        if let Some(collection) = self.collections.iter().find(|c| site::is_reserved(c.name())) {
            return Err(BuildError::Configuration(format!(
                "Collection name `{}` is reserved for site attributes",
                collection.name()
            )));
        }
        Ok(())
    }

    pub(super) fn initialize_plugins(&mut self, options: &BuildOptions) -> Result<(), BuildError> {
        self.enter(Phase::PluginInit);

        if options.safe {
            vlog!("plugin"; "safe mode, {} plugin(s) skipped", self.plugins.len());
            return Ok(());
        }
        self.plugins.initialize(&mut self.hooks.plugins)?;
        Ok(())
    }

    // ========================================================================
    // Load → Classify → GeneratorExpand → SortAndLink
    // ========================================================================

    /// Fire `start`, prepare site attributes and pull everything from the
    /// source. Returns the loaded items in discovery order.
    pub(super) fn load(&mut self, options: &BuildOptions) -> Result<Vec<Item>, BuildError> {
        self.enter(Phase::Load);

        let mut site_tree = options.site.clone();
        let mut event = Event::Start(StartEvent {
            source: &mut self.source,
            writer: &mut self.writer,
            converter: &mut self.converter,
            generators: &mut self.generators,
            renderer: &mut self.renderer,
            attributes: &mut site_tree,
        });
        self.hooks.dispatch(&mut event)?;

        self.prepare_site(site_tree, options);
        self.writer.set_up()?;
        self.renderer.clear();

        self.source.load()?;
        self.layouts = self.source.layouts();
        self.includes = self.source.includes();
        let items = self.source.items();

        vlog!(
            "load";
            "{} items, {} layouts, {} includes",
            items.len(),
            self.layouts.len(),
            self.includes.len()
        );
        Ok(items)
    }

    fn prepare_site(&mut self, site_tree: AttributeBag, options: &BuildOptions) {
        self.site.initialize(site_tree);
        self.site.set("spress", options.spress.clone());
        self.site.set("site.drafts", options.drafts);
        self.site.set("site.safe", options.safe);
        self.site.set("site.timezone", self.timezone.name());
    }

    /// Assign collections, apply the draft and output filters and store
    /// the items. Items with a `generator` attribute are returned instead.
    pub(super) fn classify(
        &mut self,
        loaded: Vec<Item>,
        options: &BuildOptions,
    ) -> Result<Vec<Item>, BuildError> {
        self.enter(Phase::Classify);

        let mut triggers: Vec<Item> = Vec::new();
        for mut item in loaded {
            if item.attributes().get("generator").is_some_and(|v| !v.is_null()) {
                match triggers.iter_mut().find(|t| t.id() == item.id()) {
                    Some(existing) => *existing = item,
                    None => triggers.push(item),
                }
                continue;
            }

            assign_collection(&self.collections, &mut self.site, &mut item);
            apply_filters(&mut item, options.drafts)?;
            self.store.upsert(item);
        }

        vlog!("classify"; "{} items stored, {} generator(s) pending", self.store.len(), triggers.len());
        Ok(triggers)
    }

    /// Run each pending generator against the items stored so far.
    pub(super) fn expand_generators(&mut self, triggers: Vec<Item>) -> Result<(), BuildError> {
        self.enter(Phase::GeneratorExpand);

        for trigger in triggers {
            let name = validate::generator(&trigger)?;
            let generated = self
                .generators
                .get(&name)?
                .generate(&trigger, self.store.items())?;
            vvlog!("generator"; "`{}` produced {} item(s) from `{}`", name, generated.len(), trigger.id());

            for mut item in generated {
                assign_collection(&self.collections, &mut self.site, &mut item);
                if let Err(DuplicateId(item)) = self.store.try_insert(item) {
                    return Err(BuildError::Conflict {
                        id: item.id().to_owned(),
                        generator: name,
                    });
                }
            }
        }
        Ok(())
    }

    /// Sort every collection declaring `sort_by`, then link neighbours.
    pub(super) fn sort_and_link(&mut self) -> Result<(), BuildError> {
        self.enter(Phase::SortAndLink);

        for collection in self.collections.iter() {
            let name = collection.name();
            let descending = match collection.attributes().get("sort_type") {
                None => true,
                Some(Value::String(s)) if s == "descending" => true,
                Some(Value::String(s)) if s == "ascending" => false,
                Some(other) => {
                    return Err(BuildError::Configuration(format!(
                        "Invalid sort_type {other} in collection `{name}`: expected `ascending` or `descending`"
                    )));
                }
            };
            let key = match collection.attributes().get("sort_by") {
                None => continue,
                Some(Value::String(key)) if key.is_empty() => continue,
                Some(Value::String(key)) => key.as_str(),
                Some(other) => {
                    return Err(BuildError::Configuration(format!(
                        "Invalid sort_by {other} in collection `{name}`: expected a string"
                    )));
                }
            };

            self.store.sort_collection(name, |a, b| {
                let ordering = compare_values(a.attributes().get(key), b.attributes().get(key));
                if descending { ordering.reverse() } else { ordering }
            });
            link_neighbours(&mut self.store, name);
            vvlog!("sort"; "`{}` by `{}` ({})", name, key, if descending { "descending" } else { "ascending" });
        }
        Ok(())
    }

    // ========================================================================
    // PrepareRender → Convert → Permalink
    // ========================================================================

    pub(super) fn prepare_render(&mut self) {
        self.enter(Phase::PrepareRender);

        for (id, layout) in &self.layouts {
            self.renderer
                .add_layout(id, layout.content(), layout.attributes());
        }
        for (id, include) in &self.includes {
            self.renderer
                .add_include(id, include.content(), include.attributes());
        }
    }

    pub(super) fn convert(&mut self) -> Result<(), BuildError> {
        self.enter(Phase::Convert);

        for item in self.store.iter_mut() {
            if item.is_excluded() {
                item.set_path("", PathSnapshot::RelativeAfterConvert);
                continue;
            }
            if item.is_binary() {
                let relative = item.relative_path().to_owned();
                item.set_path(relative, PathSnapshot::RelativeAfterConvert);
                continue;
            }

            self.hooks.dispatch(&mut Event::BeforeConvert(ContentEvent::new(
                item,
                Snapshot::Raw,
                PathSnapshot::Relative,
            )))?;

            let result = self.converter.convert_item(item)?;
            let relative = item.relative_path();
            let stem = relative
                .strip_suffix(result.input_extension.as_str())
                .unwrap_or(relative);
            let converted = format!("{stem}{}", result.extension);

            vvlog!("convert"; "{} → {}", relative, converted);
            item.set_content(result.body, Snapshot::AfterConvert);
            item.set_path(converted, PathSnapshot::RelativeAfterConvert);

            self.hooks.dispatch(&mut Event::AfterConvert(ContentEvent::new(
                item,
                Snapshot::AfterConvert,
                PathSnapshot::RelativeAfterConvert,
            )))?;
        }
        Ok(())
    }

    pub(super) fn resolve_permalinks(&mut self) -> Result<(), BuildError> {
        self.enter(Phase::Permalink);

        for item in self.store.iter_mut() {
            let permalink = self.permalinks.resolve(item, self.timezone)?;
            vvlog!("permalink"; "{} → {}", item.id(), permalink.url);

            item.set_path(permalink.path, PathSnapshot::Permalink);
            item.attributes_mut().set("url", permalink.url);
            self.site.set_item(item);
        }
        Ok(())
    }

    // ========================================================================
    // RenderBlocks → RenderPage (+ write) → Finish
    // ========================================================================

    pub(super) fn render_blocks(&mut self) -> Result<(), BuildError> {
        self.enter(Phase::RenderBlocks);

        for item in self.store.iter_mut() {
            if item.is_excluded() || item.is_binary() {
                continue;
            }
            if validate::bool_attribute(item, "avoid_renderizer")? == Some(true) {
                continue;
            }

            self.hooks.dispatch(&mut Event::BeforeRenderBlocks(ContentEvent::new(
                item,
                Snapshot::AfterConvert,
                PathSnapshot::RelativeAfterConvert,
            )))?;
            self.site.set_item(item);

            let content = item
                .content_at(Snapshot::AfterConvert)
                .unwrap_or_else(|| item.content());
            let rendered = self
                .renderer
                .render_blocks(item.id(), content, self.site.attributes())?;
            item.set_content(rendered, Snapshot::AfterRenderBlocks);

            self.hooks.dispatch(&mut Event::AfterRenderBlocks(ContentEvent::new(
                item,
                Snapshot::AfterRenderBlocks,
                PathSnapshot::RelativeAfterConvert,
            )))?;
        }
        Ok(())
    }

    /// Wrap each item in its layout, write it and record the layout
    /// dependency.
    pub(super) fn render_pages(&mut self) -> Result<(), BuildError> {
        self.enter(Phase::RenderPage);

        let mut written = 0usize;
        for item in self.store.iter_mut() {
            let avoid = validate::bool_attribute(item, "avoid_renderizer")? == Some(true);
            let layout = if avoid { None } else { validate::layout(item)? };
            if item.is_excluded() {
                continue;
            }

            let rendered_with = if avoid || item.is_binary() {
                None
            } else {
                self.hooks.dispatch(&mut Event::BeforeRenderPage(ContentEvent::new(
                    item,
                    Snapshot::AfterRenderBlocks,
                    PathSnapshot::RelativeAfterConvert,
                )))?;
                self.site.set_item(item);

                let content = item
                    .content_at(Snapshot::AfterRenderBlocks)
                    .unwrap_or_else(|| item.content());
                let rendered = self.renderer.render_page(
                    item.id(),
                    content,
                    layout.as_deref(),
                    self.site.attributes(),
                )?;
                item.set_content(rendered, Snapshot::AfterRenderPage);

                self.hooks.dispatch(&mut Event::AfterRenderPage(ContentEvent::new(
                    item,
                    Snapshot::AfterRenderPage,
                    PathSnapshot::RelativeAfterConvert,
                )))?;
                layout
            };

            self.writer.write(item)?;
            written += 1;

            if let (Some(tracker), Some(layout)) = (&self.dependency_tracker, &rendered_with) {
                match self.layouts.get(layout) {
                    Some(source) => {
                        tracker.register_dependency(source.relative_path(), item.relative_path());
                    }
                    None => {
                        log!("warn"; "layout `{}` of `{}` has no source, dependency not recorded", layout, item.id());
                    }
                }
            }
        }

        vlog!("write"; "{} item(s) written", written);
        Ok(())
    }

    pub(super) fn finish(&mut self, options: &BuildOptions) -> Result<(), BuildError> {
        self.enter(Phase::Finish);

        self.writer.tear_down()?;
        self.hooks.dispatch(&mut Event::Finish(FinishEvent {
            items: self.store.items(),
            site: self.site.attributes(),
        }))?;
        if !options.safe {
            self.plugins.tear_down()?;
        }
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Place `item` in its collection: merge the collection defaults under
/// its attributes, stamp `collection` and expose the collection as
/// `site.collections.<name>`.
fn assign_collection(collections: &CollectionManager, site: &mut SiteAttributes, item: &mut Item) {
    let collection = collections.collection_for(item);
    let name = collection.name();

    item.attributes_mut().merge_under(collection.attributes());
    item.attributes_mut().set("collection", name);
    item.set_collection(name);
    site.set(
        &format!("site.collections.{}", escape_dot(name)),
        collection.site_projection(),
    );
    vvlog!("collection"; "{} → {}", item.id(), name);
}

/// Draft and output filters. An item with `output = false` keeps its
/// place in the store but loses its source and relative paths.
fn apply_filters(item: &mut Item, include_drafts: bool) -> Result<(), BuildError> {
    let draft = validate::bool_attribute(item, "draft")?.unwrap_or(false);
    item.attributes_mut().add("draft", false);

    if draft && !include_drafts && item.collection() == Some(POSTS_COLLECTION) {
        item.attributes_mut().set("output", false);
    }

    if validate::bool_attribute(item, "output")? == Some(false) {
        vvlog!("filter"; "{} excluded from output", item.id());
        item.set_path("", PathSnapshot::Relative);
        item.set_path("", PathSnapshot::Source);
    }
    Ok(())
}

/// Rebuild `prior`/`next` of a collection from its current order.
fn link_neighbours(store: &mut ItemStore, collection: &str) {
    let ids = store.ids_in_collection(collection);

    for (index, id) in ids.iter().enumerate() {
        let Some(item) = store.get_mut(id) else {
            continue;
        };
        let relationships = item.relationships_mut();
        relationships.remove("prior");
        relationships.remove("next");

        if let Some(prior) = index.checked_sub(1).and_then(|i| ids.get(i)) {
            relationships.add("prior", prior);
        }
        if let Some(next) = ids.get(index + 1) {
            relationships.add("next", next);
        }
    }
}

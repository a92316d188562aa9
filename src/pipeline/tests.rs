//! End-to-end pipeline scenarios using the in-memory collaborators.

use super::*;
use crate::{
    attributes::AttributeBag,
    collection::Collection,
    converter::Converter,
    deps::DependencyGraph,
    events::HookPoint,
    generator::Generator,
    item::{PathSnapshot, Snapshot},
    source::MemorySource,
};
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// ============================================================================
// Fixtures
// ============================================================================

/// `.md` → `.html`, wrapping the trimmed body in a paragraph.
struct Markdown;

impl Converter for Markdown {
    fn name(&self) -> &str {
        "markdown"
    }

    fn matches(&self, extension: &str) -> bool {
        extension == ".md"
    }

    fn convert(&mut self, input: &str) -> Result<String> {
        Ok(format!("<p>{}</p>", input.trim()))
    }

    fn output_extension(&self, _extension: &str) -> String {
        ".html".to_owned()
    }
}

/// Records the ids it was shown and returns fixed items.
struct Spy {
    seen: Rc<RefCell<Vec<String>>>,
    output: Vec<Item>,
}

impl Generator for Spy {
    fn generate(&mut self, _trigger: &Item, items: &[Item]) -> Result<Vec<Item>> {
        self.seen
            .borrow_mut()
            .extend(items.iter().map(|item| item.id().to_owned()));
        Ok(self.output.clone())
    }
}

fn item(id: &str, content: &str, attrs: Value) -> Item {
    Item::new(id, content, id).with_attributes(AttributeBag::from_value(attrs))
}

fn posts(attrs: Value) -> CollectionManager {
    let mut collections = CollectionManager::new();
    collections.add(Collection::new("posts", "posts", AttributeBag::from_value(attrs)));
    collections
}

fn pipeline(source: MemorySource) -> (Pipeline, MemoryWriter) {
    let writer = MemoryWriter::new();
    let pipeline = Pipeline::new(source)
        .with_writer(writer.clone())
        .with_converter(ConverterManager::new().with(Markdown));
    (pipeline, writer)
}

fn ids(items: &[Item]) -> Vec<&str> {
    items.iter().map(Item::id).collect()
}

fn find<'a>(items: &'a [Item], id: &str) -> &'a Item {
    items
        .iter()
        .find(|item| item.id() == id)
        .unwrap_or_else(|| panic!("item `{id}` missing"))
}

// ============================================================================
// Load and classification
// ============================================================================

#[test]
fn test_final_ids_are_unique() {
    let source = MemorySource::new()
        .with_item(item("a.md", "first", json!({})))
        .with_item(item("b.md", "b", json!({})))
        .with_item(item("a.md", "second", json!({})));
    let (mut pipeline, _) = pipeline(source);

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(ids(&items), vec!["a.md", "b.md"]);
    assert_eq!(find(&items, "a.md").content_at(Snapshot::Raw), Some("second"));
}

#[test]
fn test_collection_defaults_merge_under_item() {
    let source = MemorySource::new()
        .with_item(item("posts/a.md", "", json!({ "author": "me" })))
        .with_item(item("about.md", "", json!({})));
    let (pipeline, _) = pipeline(source);
    let mut pipeline =
        pipeline.with_collections(posts(json!({ "author": "staff", "comments": true })));

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    let post = find(&items, "posts/a.md");
    assert_eq!(post.collection(), Some("posts"));
    assert_eq!(post.attributes().get_str("collection"), Some("posts"));
    assert_eq!(post.attributes().get_str("author"), Some("me"));
    assert_eq!(post.attributes().get("comments"), Some(&json!(true)));
    assert_eq!(find(&items, "about.md").collection(), Some("pages"));

    let site = pipeline.site().attributes();
    assert_eq!(site.get_str("site.collections.posts.path"), Some("posts"));
    assert_eq!(site.get_str("site.collections.pages.path"), Some(""));
}

#[test]
fn test_site_attributes_seeded() {
    let (mut pipeline, _) = pipeline(MemorySource::new());
    let options = BuildOptions::default()
        .with_site(AttributeBag::from_value(json!({ "title": "My blog" })))
        .with_drafts(true)
        .with_timezone("Europe/Madrid");

    pipeline.build(&options).unwrap();

    let site = pipeline.site().attributes();
    assert_eq!(site.get_str("site.title"), Some("My blog"));
    assert_eq!(site.get("site.drafts"), Some(&json!(true)));
    assert_eq!(site.get("site.safe"), Some(&json!(false)));
    assert_eq!(site.get_str("site.timezone"), Some("Europe/Madrid"));
    assert!(site.has("spress.version"));
}

// ============================================================================
// Drafts and output
// ============================================================================

#[test]
fn test_draft_post_is_excluded() {
    let source = MemorySource::new()
        .with_item(item("posts/draft.md", "wip", json!({ "draft": true })))
        .with_item(item("posts/done.md", "ok", json!({})));
    let (pipeline, writer) = pipeline(source);
    let mut pipeline = pipeline.with_collections(posts(json!({})));

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    let draft = find(&items, "posts/draft.md");
    assert_eq!(draft.path(PathSnapshot::Relative), Some(""));
    assert_eq!(draft.path(PathSnapshot::Source), Some(""));
    assert_eq!(draft.attributes().get("output"), Some(&json!(false)));
    assert_eq!(draft.attributes().get_str("url"), Some(""));
    assert_eq!(writer.ids(), vec!["posts/done.md"]);
    assert_eq!(find(&items, "posts/done.md").attributes().get("draft"), Some(&json!(false)));
}

#[test]
fn test_drafts_published_when_enabled() {
    let source =
        MemorySource::new().with_item(item("posts/draft.md", "wip", json!({ "draft": true })));
    let (pipeline, writer) = pipeline(source);
    let mut pipeline = pipeline.with_collections(posts(json!({})));

    pipeline
        .build(&BuildOptions::default().with_drafts(true))
        .unwrap();

    assert_eq!(writer.ids(), vec!["posts/draft.md"]);
}

#[test]
fn test_draft_outside_posts_is_published() {
    let source = MemorySource::new().with_item(item("notes.md", "", json!({ "draft": true })));
    let (mut pipeline, writer) = pipeline(source);

    pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(writer.ids(), vec!["notes.md"]);
}

#[test]
fn test_invalid_draft_type() {
    let source = MemorySource::new().with_item(item("posts/a.md", "", json!({ "draft": "yes" })));
    let (mut pipeline, writer) = pipeline(source);

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();

    assert!(matches!(
        err,
        BuildError::AttributeValue { attribute: "draft", ref path, .. } if path == "posts/a.md"
    ));
    assert!(writer.is_empty());
}

#[test]
fn test_invalid_output_type() {
    let source = MemorySource::new().with_item(item("a.md", "", json!({ "output": 0 })));
    let (mut pipeline, _) = pipeline(source);

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();
    assert!(matches!(err, BuildError::AttributeValue { attribute: "output", .. }));
}

#[test]
fn test_excluded_item_is_visible_to_generators() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let source = MemorySource::new()
        .with_item(item("secret.md", "", json!({ "output": false })))
        .with_item(item("spy.html", "", json!({ "generator": "spy" })))
        .with_item(item("public.md", "", json!({})));
    let (mut pipeline, writer) = pipeline(source);
    pipeline.generators_mut().add(
        "spy",
        Spy {
            seen: Rc::clone(&seen),
            output: Vec::new(),
        },
    );

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(*seen.borrow(), vec!["secret.md", "public.md"]);
    assert_eq!(writer.ids(), vec!["public.md"]);
    assert!(!items.iter().any(|item| item.id() == "spy.html"));
}

// ============================================================================
// Generators
// ============================================================================

#[test]
fn test_generator_conflict() {
    let source = MemorySource::new()
        .with_item(item("posts/a.md", "", json!({})))
        .with_item(item("gen.html", "", json!({ "generator": "clone" })));
    let (mut pipeline, writer) = pipeline(source);
    pipeline.generators_mut().add(
        "clone",
        Spy {
            seen: Rc::default(),
            output: vec![item("posts/a.md", "", json!({}))],
        },
    );

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();

    match err {
        BuildError::Conflict { id, generator } => {
            assert_eq!(id, "posts/a.md");
            assert_eq!(generator, "clone");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(writer.is_empty());
}

#[test]
fn test_generated_items_are_classified() {
    let source = MemorySource::new().with_item(item("gen.html", "", json!({ "generator": "one" })));
    let (pipeline, writer) = pipeline(source);
    let mut pipeline = pipeline.with_collections(posts(json!({ "layout_hint": "post" })));
    pipeline.generators_mut().add(
        "one",
        Spy {
            seen: Rc::default(),
            output: vec![item("posts/generated.md", "", json!({}))],
        },
    );

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    let generated = find(&items, "posts/generated.md");
    assert_eq!(generated.collection(), Some("posts"));
    assert_eq!(generated.attributes().get_str("layout_hint"), Some("post"));
    assert_eq!(writer.ids(), vec!["posts/generated.md"]);
}

#[test]
fn test_unknown_generator() {
    let source = MemorySource::new().with_item(item("gen.html", "", json!({ "generator": "nope" })));
    let (mut pipeline, _) = pipeline(source);

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();
    assert!(matches!(err, BuildError::Configuration(msg) if msg.contains("nope")));
}

#[test]
fn test_null_generator_is_not_a_trigger() {
    let source = MemorySource::new().with_item(item("a.html", "", json!({ "generator": null })));
    let (mut pipeline, writer) = pipeline(source);

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(ids(&items), vec!["a.html"]);
    assert_eq!(writer.ids(), vec!["a.html"]);
}

#[test]
fn test_pagination_end_to_end() {
    let mut source = MemorySource::new();
    for n in 1..=3 {
        source.add_item(item(&format!("posts/{n}.md"), "", json!({ "n": n })));
    }
    source.add_item(item(
        "blog/index.html",
        "{{ page.paginator.current_page }}/{{ page.paginator.total_pages }}",
        json!({ "generator": "pagination", "max_page": 2 }),
    ));
    let (pipeline, writer) = pipeline(source);
    let mut pipeline = pipeline.with_collections(posts(json!({})));

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    let first = find(&items, "blog/index.html");
    let second = find(&items, "blog/page2/index.html");
    assert_eq!(first.content(), "1/2");
    assert_eq!(second.content(), "2/2");
    assert_eq!(second.attributes().get_str("url"), Some("/blog/page2/"));
    assert_eq!(
        first.attributes().get("paginator.items"),
        Some(&json!(["posts/1.md", "posts/2.md"]))
    );
    assert_eq!(writer.len(), 5);
}

#[test]
fn test_pagination_pattern_does_not_leak_into_page_permalinks() {
    let mut source = MemorySource::new();
    for n in 1..=3 {
        source.add_item(item(&format!("posts/{n}.md"), "", json!({})));
    }
    source.add_item(item(
        "blog/index.html",
        "{{ page.paginator.next_page_path }}",
        json!({ "generator": "pagination", "max_page": 1, "permalink": "/p/:num" }),
    ));
    let (pipeline, writer) = pipeline(source);
    let mut pipeline = pipeline.with_collections(posts(json!({})));

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    let permalinks: Vec<&str> = ["blog/index.html", "blog/p/2/index.html", "blog/p/3/index.html"]
        .iter()
        .map(|id| find(&items, id).path(PathSnapshot::Permalink).unwrap_or_default())
        .collect();
    assert_eq!(
        permalinks,
        vec!["blog/index.html", "blog/p/2/index.html", "blog/p/3/index.html"]
    );
    assert_eq!(find(&items, "blog/index.html").content(), "/blog/p/2/");
    assert_eq!(
        find(&items, "blog/p/2/index.html").attributes().get_str("url"),
        Some("/blog/p/2/")
    );
    assert_eq!(writer.len(), 6);
}

// ============================================================================
// Sorting and relationships
// ============================================================================

fn dated(id: &str, date: &str) -> Item {
    item(id, "", json!({ "date": date }))
}

fn dated_source() -> MemorySource {
    MemorySource::new()
        .with_item(dated("posts/p1.md", "2024-01-02"))
        .with_item(item("about.md", "", json!({})))
        .with_item(dated("posts/p2.md", "2024-01-01"))
        .with_item(dated("posts/p3.md", "2024-01-02"))
        .with_item(dated("posts/p4.md", "2023-12-31"))
}

#[test]
fn test_sort_ascending_is_stable() {
    let (pipeline, _) = pipeline(dated_source());
    let mut pipeline =
        pipeline.with_collections(posts(json!({ "sort_by": "date", "sort_type": "ascending" })));

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(
        ids(&items),
        vec!["posts/p4.md", "about.md", "posts/p2.md", "posts/p1.md", "posts/p3.md"]
    );
}

#[test]
fn test_sort_descending_by_default() {
    let (pipeline, _) = pipeline(dated_source());
    let mut pipeline = pipeline.with_collections(posts(json!({ "sort_by": "date" })));

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(
        ids(&items),
        vec!["posts/p1.md", "about.md", "posts/p3.md", "posts/p2.md", "posts/p4.md"]
    );
}

#[test]
fn test_relationships_follow_sorted_order() {
    let (pipeline, _) = pipeline(dated_source());
    let mut pipeline =
        pipeline.with_collections(posts(json!({ "sort_by": "date", "sort_type": "ascending" })));

    let items = pipeline.build(&BuildOptions::default()).unwrap();
    let sorted: Vec<&Item> = items
        .iter()
        .filter(|item| item.collection() == Some("posts"))
        .collect();

    assert_eq!(sorted[0].relationships().first("prior"), None);
    assert_eq!(sorted[sorted.len() - 1].relationships().first("next"), None);
    for pair in sorted.windows(2) {
        assert_eq!(pair[0].relationships().first("next"), Some(pair[1].id()));
        assert_eq!(pair[1].relationships().first("prior"), Some(pair[0].id()));
    }
    assert!(find(&items, "about.md").relationships().is_empty());
}

#[test]
fn test_sort_by_order_end_to_end() {
    let source = MemorySource::new()
        .with_item(item("posts/b.md", "", json!({ "order": 2 })))
        .with_item(item("posts/a.md", "", json!({ "order": 1 })));
    let (pipeline, _) = pipeline(source);
    let mut pipeline =
        pipeline.with_collections(posts(json!({ "sort_by": "order", "sort_type": "ascending" })));

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(ids(&items), vec!["posts/a.md", "posts/b.md"]);
    assert_eq!(items[0].relationships().first("next"), Some("posts/b.md"));
    assert_eq!(items[1].relationships().first("prior"), Some("posts/a.md"));
    assert_eq!(items[0].relationships().first("prior"), None);
    assert_eq!(items[1].relationships().first("next"), None);
}

#[test]
fn test_invalid_sort_type() {
    let (pipeline, writer) = pipeline(dated_source());
    let mut pipeline = pipeline.with_collections(posts(json!({ "sort_type": "random" })));

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();

    assert!(matches!(err, BuildError::Configuration(msg) if msg.contains("sort_type")));
    assert!(writer.is_empty());
}

// ============================================================================
// Convert, permalink and render
// ============================================================================

#[test]
fn test_convert_replaces_consumed_extension() {
    let source = MemorySource::new().with_item(item("post.md", "hello", json!({})));
    let (mut pipeline, _) = pipeline(source);

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    let post = &items[0];
    assert_eq!(post.path(PathSnapshot::RelativeAfterConvert), Some("post.html"));
    assert_eq!(post.content_at(Snapshot::AfterConvert), Some("<p>hello</p>"));
    assert_eq!(post.path(PathSnapshot::Permalink), Some("post/index.html"));
    assert_eq!(post.attributes().get_str("url"), Some("/post/"));
}

#[test]
fn test_binary_item_skips_convert_and_render() {
    let source = MemorySource::new().with_item(Item::binary("img/logo.md", "img/logo.md"));
    let (mut pipeline, writer) = pipeline(source);

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    let logo = &items[0];
    assert_eq!(logo.path(PathSnapshot::RelativeAfterConvert), Some("img/logo.md"));
    assert_eq!(logo.content_at(Snapshot::AfterConvert), None);
    assert_eq!(logo.content_at(Snapshot::AfterRenderPage), None);
    assert_eq!(writer.ids(), vec!["img/logo.md"]);
}

#[test]
fn test_render_with_layout_chain() {
    let source = MemorySource::new()
        .with_item(item("about.md", "I am {{ page.title }}", json!({ "title": "me", "layout": "page" })))
        .with_layout(item("base", "<html>{{ page.content }}</html>", json!({})))
        .with_layout(item("page", "<main>{{ page.content }}</main>", json!({ "layout": "base" })));
    let (mut pipeline, writer) = pipeline(source);

    pipeline.build(&BuildOptions::default()).unwrap();

    let written = writer.get("about.md").unwrap();
    assert_eq!(written.content_at(Snapshot::AfterRenderBlocks), Some("<p>I am me</p>"));
    assert_eq!(written.content(), "<html><main><p>I am me</p></main></html>");
}

#[test]
fn test_empty_layout_is_rejected() {
    let source = MemorySource::new().with_item(item("about.md", "", json!({ "layout": "" })));
    let (mut pipeline, _) = pipeline(source);

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();

    match err {
        BuildError::AttributeValue { attribute, path, .. } => {
            assert_eq!(attribute, "layout");
            assert_eq!(path, "about.md");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_layout_rejected_on_excluded_item() {
    let source =
        MemorySource::new().with_item(item("hidden.md", "", json!({ "output": false, "layout": "" })));
    let (mut pipeline, _) = pipeline(source);

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();
    assert!(matches!(err, BuildError::AttributeValue { attribute: "layout", .. }));
}

#[test]
fn test_empty_layout_rejected_on_binary_item() {
    let mut logo = Item::binary("img/logo.png", "img/logo.png");
    logo.attributes_mut().set("layout", "");
    let (mut pipeline, writer) = pipeline(MemorySource::new().with_item(logo));

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();

    assert!(matches!(
        err,
        BuildError::AttributeValue { attribute: "layout", ref path, .. } if path == "img/logo.png"
    ));
    assert!(writer.is_empty());
}

#[test]
fn test_avoid_renderizer_keeps_content() {
    let source = MemorySource::new().with_item(item(
        "raw.html",
        "{{ page.title }}",
        json!({ "avoid_renderizer": true, "layout": "missing" }),
    ));
    let (mut pipeline, writer) = pipeline(source);

    pipeline.build(&BuildOptions::default()).unwrap();

    let written = writer.get("raw.html").unwrap();
    assert_eq!(written.content(), "{{ page.title }}");
    assert_eq!(written.content_at(Snapshot::AfterRenderBlocks), None);
    assert_eq!(written.content_at(Snapshot::AfterRenderPage), None);
}

#[test]
fn test_avoid_renderizer_must_be_boolean() {
    let source =
        MemorySource::new().with_item(item("a.html", "", json!({ "avoid_renderizer": "yes" })));
    let (mut pipeline, _) = pipeline(source);

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();
    assert!(matches!(err, BuildError::AttributeValue { attribute: "avoid_renderizer", .. }));
}

#[test]
fn test_unknown_layout_is_collaborator_error() {
    let source = MemorySource::new().with_item(item("a.html", "", json!({ "layout": "ghost" })));
    let (mut pipeline, _) = pipeline(source);

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();
    assert!(matches!(err, BuildError::Collaborator(_)));
    assert!(err.to_string().contains("ghost"));
}

// ============================================================================
// Setup, dependencies, events and plugins
// ============================================================================

#[test]
fn test_invalid_timezone_fails_before_io() {
    let source = MemorySource::new().with_item(item("a.md", "", json!({})));
    let (mut pipeline, writer) = pipeline(source);

    let err = pipeline
        .build(&BuildOptions::default().with_timezone("Nowhere/City"))
        .unwrap_err();

    assert!(matches!(err, BuildError::Configuration(msg) if msg.contains("Nowhere/City")));
    assert_eq!(pipeline.phase(), Phase::Setup);
    assert!(writer.is_empty());

    let err = pipeline
        .build(&BuildOptions::default().with_timezone(""))
        .unwrap_err();
    assert!(matches!(err, BuildError::Configuration(_)));
}

#[test]
fn test_dependency_tracker_attach_once() {
    let (mut pipeline, _) = pipeline(MemorySource::new());

    pipeline.set_dependency_tracker(DependencyGraph::new()).unwrap();
    let err = pipeline
        .set_dependency_tracker(DependencyGraph::new())
        .unwrap_err();

    assert!(matches!(err, BuildError::Configuration(_)));
}

#[test]
fn test_layout_dependencies_recorded() {
    let source = MemorySource::new()
        .with_item(item("about.md", "", json!({ "layout": "default" })))
        .with_item(item("contact.md", "", json!({})))
        .with_layout(Item::new("default", "{{ page.content }}", "_layouts/default.html"));
    let (mut pipeline, _) = pipeline(source);
    let graph = DependencyGraph::new();
    pipeline.set_dependency_tracker(graph.clone()).unwrap();

    pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(graph.dependents_of("_layouts/default.html"), vec!["about.md"]);
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_events_fire_in_phase_order() {
    let fired = Rc::new(RefCell::new(Vec::new()));
    let source = MemorySource::new().with_item(item("a.md", "x", json!({})));
    let (mut pipeline, _) = pipeline(source);
    for hook in HookPoint::ALL {
        let fired = Rc::clone(&fired);
        pipeline.events_mut().listen(hook, move |event| {
            fired.borrow_mut().push(event.hook_point().name());
            Ok(())
        });
    }

    pipeline.build(&BuildOptions::default()).unwrap();

    let expected: Vec<&str> = HookPoint::ALL.iter().map(|hook| hook.name()).collect();
    assert_eq!(*fired.borrow(), expected);
    assert_eq!(pipeline.phase(), Phase::Finish);
}

#[test]
fn test_listener_rewrites_content_and_path() {
    let source = MemorySource::new().with_item(item("a.md", "quiet", json!({})));
    let (mut pipeline, _) = pipeline(source);
    pipeline
        .events_mut()
        .listen(HookPoint::BeforeConvert, |event| {
            if let Some(event) = event.as_content_mut() {
                let loud = event.content().to_uppercase();
                event.set_content(loud);
                event.set_path("renamed.md");
            }
            Ok(())
        });

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(items[0].content(), "<p>QUIET</p>");
    assert_eq!(items[0].path(PathSnapshot::RelativeAfterConvert), Some("renamed.html"));
}

#[test]
fn test_before_render_listeners_reach_render_context() {
    let source = MemorySource::new()
        .with_item(item("a.html", "T={{ page.title }}", json!({ "title": "old", "layout": "main" })))
        .with_layout(item("main", "{{ page.heading }}|{{ page.content }}", json!({})));
    let (mut pipeline, _) = pipeline(source);
    pipeline
        .events_mut()
        .listen(HookPoint::BeforeRenderBlocks, |event| {
            if let Some(event) = event.as_content_mut() {
                event.item_mut().attributes_mut().set("title", "new");
            }
            Ok(())
        });
    pipeline
        .events_mut()
        .listen(HookPoint::BeforeRenderPage, |event| {
            if let Some(event) = event.as_content_mut() {
                event.item_mut().attributes_mut().set("heading", "H");
            }
            Ok(())
        });

    let items = pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(items[0].content_at(Snapshot::AfterRenderBlocks), Some("T=new"));
    assert_eq!(items[0].content(), "H|T=new");
}

#[test]
fn test_reserved_collection_name() {
    let mut collections = CollectionManager::new();
    collections.add(Collection::new("drafts", "drafts", AttributeBag::new()));
    let (pipeline, writer) = pipeline(MemorySource::new().with_item(item("a.md", "", json!({}))));
    let mut pipeline = pipeline.with_collections(collections);

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();

    assert!(matches!(err, BuildError::Configuration(msg) if msg.contains("drafts")));
    assert_eq!(pipeline.phase(), Phase::Setup);
    assert!(writer.is_empty());
}

#[test]
fn test_listener_error_aborts_build() {
    let source = MemorySource::new().with_item(item("a.md", "", json!({})));
    let (mut pipeline, writer) = pipeline(source);
    pipeline
        .events_mut()
        .listen(HookPoint::AfterRenderBlocks, |_| anyhow::bail!("listener failed"));

    let err = pipeline.build(&BuildOptions::default()).unwrap_err();

    assert_eq!(err.to_string(), "listener failed");
    assert_eq!(pipeline.phase(), Phase::RenderBlocks);
    assert!(writer.is_empty());
}

#[test]
fn test_start_listener_swaps_writer() {
    let source = MemorySource::new().with_item(item("a.md", "", json!({})));
    let (mut pipeline, original) = pipeline(source);
    let replacement = MemoryWriter::new();
    {
        let replacement = replacement.clone();
        pipeline.events_mut().listen(HookPoint::Start, move |event| {
            if let Some(start) = event.as_start_mut() {
                *start.writer = Box::new(replacement.clone());
            }
            Ok(())
        });
    }

    pipeline.build(&BuildOptions::default()).unwrap();

    assert!(original.is_empty());
    assert_eq!(replacement.ids(), vec!["a.md"]);
}

struct Flags {
    initialized: Rc<Cell<bool>>,
    torn_down: Rc<Cell<bool>>,
}

impl Plugin for Flags {
    fn name(&self) -> &str {
        "flags"
    }

    fn initialize(&mut self, events: &mut EventDispatcher) -> Result<()> {
        self.initialized.set(true);
        events.listen(HookPoint::AfterRenderPage, |event| {
            if let Some(event) = event.as_content_mut() {
                let signed = format!("{}<!-- flags -->", event.content());
                event.set_content(signed);
            }
            Ok(())
        });
        Ok(())
    }

    fn tear_down(&mut self) -> Result<()> {
        self.torn_down.set(true);
        Ok(())
    }
}

fn flagged(safe: bool) -> (bool, bool, String) {
    let initialized = Rc::new(Cell::new(false));
    let torn_down = Rc::new(Cell::new(false));
    let source = MemorySource::new().with_item(item("a.html", "body", json!({})));
    let (pipeline, writer) = pipeline(source);
    let mut pipeline = pipeline.with_plugin(Flags {
        initialized: Rc::clone(&initialized),
        torn_down: Rc::clone(&torn_down),
    });

    pipeline
        .build(&BuildOptions::default().with_safe(safe))
        .unwrap();

    let content = writer
        .get("a.html")
        .map(|item| item.content().to_owned())
        .unwrap_or_default();
    (initialized.get(), torn_down.get(), content)
}

#[test]
fn test_plugins_run_outside_safe_mode() {
    assert_eq!(flagged(false), (true, true, "body<!-- flags -->".to_owned()));
}

#[test]
fn test_safe_mode_skips_plugins() {
    assert_eq!(flagged(true), (false, false, "body".to_owned()));
}

#[test]
fn test_rebuild_is_idempotent() {
    let source = MemorySource::new()
        .with_item(item("a.md", "a", json!({})))
        .with_item(item("b.md", "b", json!({ "layout": "default" })))
        .with_layout(item("default", "[{{ page.content }}]", json!({})));
    let (pipeline, writer) = pipeline(source);
    let mut pipeline = pipeline.with_plugin(Flags {
        initialized: Rc::default(),
        torn_down: Rc::default(),
    });

    let first = pipeline.build(&BuildOptions::default()).unwrap();
    let second = pipeline.build(&BuildOptions::default()).unwrap();

    assert_eq!(first, second);
    assert_eq!(writer.len(), 2);
    assert_eq!(
        writer.get("b.md").map(|item| item.content().to_owned()),
        Some("[<p>b</p>]<!-- flags -->".to_owned())
    );
}

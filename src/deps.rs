//! Build dependency tracking.
//!
//! While rendering, the pipeline records which layout file each page was
//! wrapped in:
//!
//! ```text
//! _layouts/default.html ──► posts/hello.md
//!                       ──► about.md
//! ```
//!
//! The graph outlives a single build: an incremental builder keeps a
//! [`DependencyGraph`] handle and asks which pages to rebuild when a layout
//! changes. The pipeline only appends.

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Sink for dependency edges.
pub trait DependencyTracker {
    /// Record that `dependent` must be rebuilt when `source` changes.
    fn register_dependency(&self, source: &str, dependent: &str);
}

/// Shared `source → dependents` edge set.
///
/// Cloning yields another handle to the same graph.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: Arc<RwLock<FxHashMap<String, FxHashSet<String>>>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages depending on `source`, sorted.
    pub fn dependents_of(&self, source: &str) -> Vec<String> {
        let edges = self.edges.read();
        let mut dependents: Vec<String> = edges
            .get(source)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        dependents.sort_unstable();
        dependents
    }

    pub fn contains(&self, source: &str, dependent: &str) -> bool {
        self.edges
            .read()
            .get(source)
            .is_some_and(|set| set.contains(dependent))
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.read().values().map(FxHashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.edges.write().clear();
    }
}

impl DependencyTracker for DependencyGraph {
    fn register_dependency(&self, source: &str, dependent: &str) {
        self.edges
            .write()
            .entry(source.to_owned())
            .or_default()
            .insert(dependent.to_owned());
    }
}

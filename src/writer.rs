//! Output persistence.
//!
//! - [`MemoryWriter`]: records written items behind a shared handle
//! - [`FilesystemWriter`]: writes each item at its permalink under an
//!   output directory

use crate::item::{Item, PathSnapshot};
use crate::vvlog;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sink for finished items.
pub trait DataWriter {
    /// Prepare the destination. Called once before anything is loaded.
    fn set_up(&mut self) -> Result<()>;

    /// Persist one item.
    fn write(&mut self, item: &Item) -> Result<()>;

    /// Release the destination. Called once at the end of a build.
    fn tear_down(&mut self) -> Result<()>;
}

// ============================================================================
// Memory
// ============================================================================

/// Writer keeping written items in memory.
///
/// Clones share the same record, so a handle kept by the caller sees what
/// the pipeline wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    written: Arc<Mutex<Vec<Item>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items written so far, in write order.
    pub fn items(&self) -> Vec<Item> {
        self.written.lock().clone()
    }

    /// Ids of the items written so far, in write order.
    pub fn ids(&self) -> Vec<String> {
        self.written
            .lock()
            .iter()
            .map(|item| item.id().to_owned())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Item> {
        self.written.lock().iter().find(|i| i.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.written.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.lock().is_empty()
    }
}

impl DataWriter for MemoryWriter {
    fn set_up(&mut self) -> Result<()> {
        self.written.lock().clear();
        Ok(())
    }

    fn write(&mut self, item: &Item) -> Result<()> {
        self.written.lock().push(item.clone());
        Ok(())
    }

    fn tear_down(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Filesystem
// ============================================================================

/// Writer placing each item at `<output>/<permalink path>`.
///
/// Text items get their latest content; binary items are copied from
/// their source path. Items with a blank permalink are skipped.
#[derive(Debug, Clone)]
pub struct FilesystemWriter {
    output: PathBuf,
    clean: bool,
}

impl FilesystemWriter {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            clean: false,
        }
    }

    /// Remove the whole output directory during set up.
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    fn destination(&self, permalink: &str) -> PathBuf {
        self.output.join(permalink.trim_start_matches('/'))
    }
}

impl DataWriter for FilesystemWriter {
    fn set_up(&mut self) -> Result<()> {
        if self.clean && self.output.exists() {
            fs::remove_dir_all(&self.output).with_context(|| {
                format!("Failed to clear output directory: {}", self.output.display())
            })?;
        }
        fs::create_dir_all(&self.output).with_context(|| {
            format!("Failed to create output directory: {}", self.output.display())
        })
    }

    fn write(&mut self, item: &Item) -> Result<()> {
        let permalink = item.path(PathSnapshot::Permalink).unwrap_or_default();
        if item.is_excluded() || permalink.trim_matches('/').is_empty() {
            return Ok(());
        }

        let dest = self.destination(permalink);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        if item.is_binary() {
            let source = item.path(PathSnapshot::Source).unwrap_or_default();
            fs::copy(source, &dest).with_context(|| {
                format!("Failed to copy `{source}` to {}", dest.display())
            })?;
        } else {
            fs::write(&dest, item.content())
                .with_context(|| format!("Failed to write {}", dest.display()))?;
        }

        vvlog!("write"; "{}", dest.display());
        Ok(())
    }

    fn tear_down(&mut self) -> Result<()> {
        Ok(())
    }
}

//! Plugins.
//!
//! A plugin hooks into a build by registering event listeners during
//! `initialize`. Plugins run in registration order and are skipped
//! entirely in safe mode.

use crate::events::EventDispatcher;
use crate::vvlog;
use anyhow::Result;

/// Build extension registered with a [`PluginManager`].
pub trait Plugin {
    fn name(&self) -> &str;

    /// Register listeners on `events`.
    fn initialize(&mut self, events: &mut EventDispatcher) -> Result<()>;

    fn tear_down(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Ordered list of plugins.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name()))
            .finish()
    }
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.push(Box::new(plugin));
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn initialize(&mut self, events: &mut EventDispatcher) -> Result<()> {
        for plugin in &mut self.plugins {
            vvlog!("plugin"; "initialize {}", plugin.name());
            plugin.initialize(events)?;
        }
        Ok(())
    }

    pub fn tear_down(&mut self) -> Result<()> {
        for plugin in &mut self.plugins {
            vvlog!("plugin"; "tear down {}", plugin.name());
            plugin.tear_down()?;
        }
        Ok(())
    }
}

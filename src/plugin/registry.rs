//! Registry of discovered plugins.
//!
//! Built once at startup and shared read-only.

use crate::plugin::descriptor::{HandlerDescriptor, PluginDescriptor};

/// Ordered collection of plugin descriptors (discovery order is preserved).
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    items: Vec<PluginDescriptor>,
}

impl PluginRegistry {
    pub fn new(items: Vec<PluginDescriptor>) -> Self {
        Self { items }
    }

    /// All plugins in discovery order.
    pub fn items(&self) -> &[PluginDescriptor] {
        &self.items
    }

    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.items.iter().find(|p| p.name == name)
    }

    /// Every declared handler across all plugins, flattened in discovery order.
    pub fn handler_descriptors(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.items.iter().flat_map(|p| p.handlers.iter())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

//! The set of plugins that can be selected.

use std::collections::BTreeMap;

use linkme::distributed_slice;
use tracing::warn;

use super::descriptor::PluginDescriptor;

/// Plugins compiled into the binary.
///
/// Built-in plugins add themselves with
/// `#[distributed_slice(BUILTIN_PLUGINS)]`.
#[distributed_slice]
pub static BUILTIN_PLUGINS: [PluginDescriptor];

/// Selection used when the plugin file names nothing.
pub const DEFAULT_PLUGINS: &[&str] = &["base"];

/// Plugins indexed by name.
#[derive(Debug, Clone, Default)]
pub struct PluginCatalog {
    plugins: BTreeMap<&'static str, PluginDescriptor>,
}

impl PluginCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding every built-in plugin.
    pub fn builtin() -> Self {
        BUILTIN_PLUGINS
            .iter()
            .copied()
            .fold(Self::new(), |catalog, desc| catalog.with(desc))
    }

    /// Adds a plugin. A later descriptor with the same name replaces the earlier one.
    pub fn with(mut self, desc: PluginDescriptor) -> Self {
        if self.plugins.insert(desc.name, desc).is_some() {
            warn!(plugin = desc.name, "Plugin registered twice, keeping the last");
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginRegistrar;

    fn noop(_: &mut PluginRegistrar) -> Result<(), crate::PluginError> {
        Ok(())
    }

    #[test]
    fn test_builtin_contains_base() {
        let catalog = PluginCatalog::builtin();
        for name in DEFAULT_PLUGINS {
            assert!(catalog.get(name).is_some(), "missing built-in {name}");
        }
    }

    #[test]
    fn test_with_replaces_same_name() {
        let catalog = PluginCatalog::new()
            .with(PluginDescriptor::new("x", noop).with_description("first"))
            .with(PluginDescriptor::new("x", noop).with_description("second"));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("x").map(|d| d.description), Some("second"));
    }
}

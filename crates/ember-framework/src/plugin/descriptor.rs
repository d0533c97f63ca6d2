//! Plugin descriptor: the static, `Copy` handle to a plugin.

use super::registrar::PluginRegistrar;
use crate::error::PluginError;

/// Registration callback. Appends the plugin's commands, responders and jobs.
pub type RegisterFn = fn(&mut PluginRegistrar) -> Result<(), PluginError>;

/// A static, `Copy` descriptor that identifies a plugin.
///
/// Use [`define_plugin!`](crate::define_plugin) to build one in a `static`.
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    /// Name used in the plugin selection file and in logs.
    pub name: &'static str,

    /// One-line description shown by the `plugins` command.
    pub description: &'static str,

    /// Called once per reload while the plugin is being installed.
    pub register: RegisterFn,

    /// Called when the runtime shuts down, if the plugin was loaded.
    pub on_shutdown: Option<fn()>,
}

impl PluginDescriptor {
    /// Creates a descriptor with no description and no shutdown hook.
    pub const fn new(name: &'static str, register: RegisterFn) -> Self {
        Self {
            name,
            description: "",
            register,
            on_shutdown: None,
        }
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_shutdown(mut self, hook: fn()) -> Self {
        self.on_shutdown = Some(hook);
        self
    }
}

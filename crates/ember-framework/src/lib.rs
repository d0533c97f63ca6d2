//! # Ember Framework
//!
//! Plugin system, hot reload and command dispatch for the Ember bot service.
//!
//! This layer provides:
//! - [`PluginDescriptor`]s and the [`define_plugin!`] macro
//! - The [`Registry`], which installs the selected plugins and schedules
//!   their jobs, and can be reloaded at any time
//! - The [`Dispatcher`], which routes inbound text to commands and
//!   responders using the per-tenant prefix
//! - The built-in `base` plugin (`help`, `prefix`, `plugins`, `reload`)

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod plugin;
pub mod registry;
pub mod responder;

pub use command::{CommandDescriptor, CommandHandler, Invocation, PermissionTier, parse_invocation};
pub use context::{CommandContext, Context};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{CommandError, CommandResult, PluginError};
pub use job::JobDescriptor;
pub use plugin::{
    BUILTIN_PLUGINS, DEFAULT_PLUGINS, PluginCatalog, PluginDescriptor, PluginRegistrar, RegisterFn,
};
pub use registry::{ActiveSet, Registry, ReloadPhase, ReloadReport};
pub use responder::ResponderDescriptor;

#[doc(hidden)]
pub use linkme;

/// Everything a plugin author usually needs.
pub mod prelude {
    pub use crate::define_plugin;
    pub use crate::{
        BUILTIN_PLUGINS, CommandContext, CommandDescriptor, CommandError, CommandResult, Context,
        JobDescriptor, PermissionTier, PluginDescriptor, PluginError, PluginRegistrar,
        ResponderDescriptor,
    };
    pub use ember_core::{InboundEvent, JobSchedule, TenantId};
}

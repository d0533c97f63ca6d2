//! Plugin system.
//!
//! A plugin is a [`PluginDescriptor`]: a name plus a registration callback
//! that fills a [`PluginRegistrar`] with commands, responders and jobs.
//! The [`Registry`](crate::Registry) runs the callbacks of every selected
//! plugin on each reload.
//!
//! ```rust,ignore
//! fn register(r: &mut PluginRegistrar) -> Result<(), PluginError> {
//!     r.command(CommandDescriptor::new("ping", |_| async { Ok(Some("Pong!".into())) }));
//!     Ok(())
//! }
//!
//! #[distributed_slice(BUILTIN_PLUGINS)]
//! static PING: PluginDescriptor = define_plugin! { name: "ping", register: register };
//! ```

pub mod builtin;
pub mod catalog;
pub mod descriptor;
pub mod macros;
pub mod registrar;

pub use catalog::{BUILTIN_PLUGINS, DEFAULT_PLUGINS, PluginCatalog};
pub use descriptor::{PluginDescriptor, RegisterFn};
pub use registrar::PluginRegistrar;

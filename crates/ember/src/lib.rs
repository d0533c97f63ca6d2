//! # Ember
//!
//! A long-running chat bot service. One configuration tree is shared by
//! every tenant (server) the bot is in, and the set of commands, passive
//! responders and scheduled jobs comes from plugins that can be reloaded
//! without restarting.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  event   ┌────────────┐  lookup   ┌──────────┐  schedule  ┌───────────────┐
//! │ Transport │─────────▶│ Dispatcher │──────────▶│ Registry │───────────▶│ TokioScheduler│
//! └───────────┘          └────────────┘           └──────────┘            └───────────────┘
//!                              │ with_tenant
//!                              ▼
//!                        ┌─────────────┐  every 5 min  ┌─────────────┐
//!                        │ ConfigStore │◀──────────────│ ConfigSaver │
//!                        └─────────────┘               └─────────────┘
//! ```
//!
//! - **Transport**: your connection to the chat service
//! - **Dispatcher**: recognizes commands by the tenant's prefix
//! - **Registry**: the active plugin set, rebuilt by `reload`
//! - **ConfigStore**: the configuration tree, mutated one tenant at a time
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use ember::prelude::*;
//!
//! fn register(r: &mut PluginRegistrar) -> Result<(), PluginError> {
//!     r.command(CommandDescriptor::new("ping", |_| async { Ok(Some("Pong!".into())) }));
//!     Ok(())
//! }
//!
//! pub static PING: PluginDescriptor = define_plugin! { name: "ping", register: register };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RuntimeError> {
//!     EmberRuntime::builder()
//!         .plugin(PING)
//!         .build(Arc::new(MyTransport::new()))?
//!         .run()
//!         .await
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): read `ember.toml`
//! - `yaml-config`: read `ember.yaml`
//! - `json-log`: JSON log lines

pub use ember_core as core;
pub use ember_framework as framework;
pub use ember_runtime as runtime;

/// Commonly used types.
pub mod prelude {
    pub use std::sync::Arc;

    pub use ember_core::{
        BotUser, ConfigStore, EventSink, InboundEvent, JobSchedule, RenderedPresence, TenantConfig,
        TenantId, Transport, TransportError, TransportResult,
    };
    pub use ember_framework::prelude::*;
    pub use ember_framework::{Dispatcher, PluginCatalog, Registry};
    pub use ember_runtime::{EmberRuntime, RuntimeError, Settings};

    pub use ember_runtime::tracing::{debug, error, info, trace, warn};
}

//! # Ember Core
//!
//! Shared state and collaborator interfaces for the Ember bot service.
//!
//! ## Shared state
//!
//! - [`ConfigStore`]: the configuration tree (global settings plus one
//!   [`TenantConfig`] per tenant) behind a single exclusive section. Tenants
//!   are resolved, created on first use and mutated with
//!   [`ConfigStore::with_tenant`]. The per-tenant command prefix is cached
//!   in an index kept in step with the tenant list.
//! - [`SelectionStore`]: the list of plugins to install, persisted
//!   separately.
//!
//! Both are plain values meant to be shared as `Arc<…>`; nothing in this
//! crate is a global.
//!
//! ## Collaborators
//!
//! - [`Scheduler`]: tag-addressed job scheduling.
//! - [`Transport`]: connection to the remote service.
//!
//! ```text
//! ┌───────────┐  InboundEvent  ┌────────────┐   with_tenant   ┌─────────────┐
//! │ Transport │───────────────▶│ Dispatcher │────────────────▶│ ConfigStore │
//! └───────────┘                └────────────┘                 └─────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod presence;
pub mod scheduler;
pub mod sync;
pub mod transport;

pub use config::{
    ConfigStore, DEFAULT_PREFIX, GlobalConfig, PluginSelection, SelectionStore, TenantConfig,
    TenantId, TenantList,
};
pub use error::{
    ConfigError, ConfigResult, SchedulerError, SchedulerResult, TransportError, TransportResult,
};
pub use event::{BotUser, InboundEvent};
pub use presence::{Presence, PresenceKind, RenderedPresence};
pub use scheduler::{BoxedScheduler, JobFn, JobHandle, JobSchedule, Scheduler, job_fn};
pub use sync::Exclusive;
pub use transport::{EventSink, Transport};

pub use futures::future::BoxFuture;

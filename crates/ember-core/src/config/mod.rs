//! The shared configuration tree.
//!
//! - [`GlobalConfig`] / [`TenantConfig`]: the persisted documents.
//! - [`TenantList`]: the tenant collection plus its derived prefix index.
//! - [`ConfigStore`]: exclusive access, tenant resolution, prefix lookup.
//! - [`SelectionStore`]: the separately persisted plugin selection.

pub mod model;
pub mod store;
pub mod tenant;

pub use model::{GlobalConfig, PluginSelection};
pub use store::{ConfigStore, SelectionStore};
pub use tenant::{DEFAULT_PREFIX, TenantConfig, TenantId, TenantList, normalize_prefix};

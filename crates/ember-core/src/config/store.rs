//! Shared stores for the configuration tree and the plugin selection.

use std::fmt::Display;
use std::time::Instant;

use tracing::debug;

use super::model::{GlobalConfig, PluginSelection};
use super::tenant::{DEFAULT_PREFIX, TenantConfig, TenantId};
use crate::error::{ConfigError, ConfigResult};
use crate::presence::Presence;
use crate::sync::Exclusive;

// =============================================================================
// ConfigStore
// =============================================================================

/// Owner of the [`GlobalConfig`] tree.
///
/// Every read and write goes through one exclusive section. Share it as
/// `Arc<ConfigStore>`; there is no global instance.
///
/// # Example
///
/// ```rust
/// use ember_core::config::{ConfigStore, GlobalConfig};
///
/// let store = ConfigStore::new(GlobalConfig::default());
/// let (tenant, _) = store
///     .with_tenant(42, |t| t.set_prefix("!"))
///     .unwrap();
/// assert_eq!(tenant.prefix, "!");
/// assert_eq!(store.prefix_for(Some(42)), "!");
/// ```
#[derive(Debug, Default)]
pub struct ConfigStore {
    section: Exclusive<GlobalConfig>,
}

impl ConfigStore {
    /// Creates a store owning `config`.
    pub fn new(config: GlobalConfig) -> Self {
        Self {
            section: Exclusive::new(config),
        }
    }

    /// Runs `mutation` with exclusive access to the whole tree.
    ///
    /// The section is released when `mutation` returns or unwinds.
    /// `mutation` must stay short and must not call back into this store;
    /// a nested call panics.
    pub fn run_exclusive<R>(&self, mutation: impl FnOnce(&mut GlobalConfig) -> R) -> R {
        self.section.run(mutation)
    }

    /// Resolves tenant `id` and applies `mutation` to a copy of its config.
    ///
    /// An unknown tenant starts from [`TenantConfig::new`]. When `mutation`
    /// returns `Ok(label)` the copy is written back (or appended) and the
    /// stored config is returned with the label; on `Err` nothing is
    /// stored, not even a freshly created default.
    pub fn with_tenant<L, E, F>(&self, id: TenantId, mutation: F) -> Result<(TenantConfig, L), E>
    where
        L: Display,
        F: FnOnce(&mut TenantConfig) -> Result<L, E>,
    {
        let start = Instant::now();

        self.run_exclusive(|config| {
            let found = config
                .tenants
                .position(id)
                .and_then(|slot| Some((slot, config.tenants.at(slot)?.clone())));

            match found {
                Some((slot, mut tenant)) => {
                    let label = mutation(&mut tenant)?;
                    tenant.id = id;
                    config.tenants.replace_at(slot, tenant.clone());

                    debug!(
                        tenant = id,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        label = %label,
                        "Tenant mutation applied"
                    );
                    Ok((tenant, label))
                }
                None => {
                    let mut tenant = TenantConfig::new(id);
                    let label = mutation(&mut tenant)?;
                    tenant.id = id;
                    config.tenants.upsert(tenant.clone());
                    Ok((tenant, label))
                }
            }
        })
    }

    /// Sets the prefix of tenant `id`.
    ///
    /// Spaces are removed; an empty result is rejected before the store is
    /// touched. Returns the stored prefix.
    pub fn set_prefix(&self, id: TenantId, raw: &str, label: &str) -> ConfigResult<String> {
        let prefix = super::tenant::normalize_prefix(raw)?;
        self.with_tenant(id, |tenant| {
            tenant.set_prefix(&prefix)?;
            Ok::<_, ConfigError>(label.to_string())
        })?;
        Ok(prefix)
    }

    /// Returns the prefix that marks a command for `tenant`.
    ///
    /// `None` (direct messages), unknown tenants and empty prefixes all
    /// resolve to [`DEFAULT_PREFIX`].
    pub fn prefix_for(&self, tenant: Option<TenantId>) -> String {
        let Some(id) = tenant else {
            return DEFAULT_PREFIX.to_string();
        };
        self.run_exclusive(|config| match config.tenants.prefix_of(id) {
            Some(prefix) if !prefix.is_empty() => prefix.to_string(),
            _ => DEFAULT_PREFIX.to_string(),
        })
    }

    /// Returns a copy of tenant `id`'s config.
    pub fn tenant(&self, id: TenantId) -> Option<TenantConfig> {
        self.run_exclusive(|config| config.tenants.get(id).cloned())
    }

    /// Returns every tenant id in insertion order.
    pub fn tenant_ids(&self) -> Vec<TenantId> {
        self.run_exclusive(|config| config.tenants.iter().map(|t| t.id).collect())
    }

    /// Returns the remote-service credential.
    pub fn credential(&self) -> String {
        self.run_exclusive(|config| config.bot_token.clone())
    }

    /// Returns the configured presence.
    pub fn presence(&self) -> Presence {
        self.run_exclusive(|config| Presence {
            name: config.activity_name.clone(),
            url: config.activity_url.clone(),
            kind: config.activity_type,
        })
    }

    /// Returns `true` if `user` may run operator-tier commands.
    pub fn is_operator(&self, user: i64) -> bool {
        self.run_exclusive(|config| config.operator_ids.contains(&user))
    }

    /// Returns the canonical command names behind an operator alias.
    pub fn operator_alias(&self, alias: &str) -> Option<Vec<String>> {
        self.run_exclusive(|config| config.operator_aliases.get(alias).cloned())
    }

    /// Replaces the whole tree, e.g. after reloading it from storage.
    pub fn replace(&self, config: GlobalConfig) {
        self.run_exclusive(|current| *current = config);
    }

    /// Returns a copy of the whole tree.
    pub fn snapshot(&self) -> GlobalConfig {
        self.run_exclusive(|config| config.clone())
    }

    /// Serializes the persisted fields as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<Vec<u8>> {
        self.run_exclusive(|config| serde_json::to_vec_pretty(config))
    }
}

// =============================================================================
// SelectionStore
// =============================================================================

/// Owner of the [`PluginSelection`], with its own exclusive section.
#[derive(Debug, Default)]
pub struct SelectionStore {
    section: Exclusive<PluginSelection>,
}

impl SelectionStore {
    /// Creates a store owning `selection`.
    pub fn new(selection: PluginSelection) -> Self {
        Self {
            section: Exclusive::new(selection),
        }
    }

    /// Runs `mutation` with exclusive access to the selection.
    pub fn run_exclusive<R>(&self, mutation: impl FnOnce(&mut PluginSelection) -> R) -> R {
        self.section.run(mutation)
    }

    /// Returns the selected plugin names in order.
    pub fn active_plugin_names(&self) -> Vec<String> {
        self.run_exclusive(|selection| selection.loaded_plugins.clone())
    }

    /// Replaces the selected plugin names.
    pub fn set(&self, names: Vec<String>) {
        self.run_exclusive(|selection| selection.loaded_plugins = names);
    }

    /// Serializes the selection as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<Vec<u8>> {
        self.run_exclusive(|selection| serde_json::to_vec_pretty(selection))
    }
}

//! Per-tenant configuration and the tenant collection.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};

/// Stable, externally assigned tenant identifier.
pub type TenantId = i64;

/// Prefix used when a tenant has none of its own, and for direct messages.
pub const DEFAULT_PREFIX: &str = ".";

fn is_zero(v: &i64) -> bool {
    *v == 0
}

// =============================================================================
// TenantConfig
// =============================================================================

/// Configuration owned by a single tenant.
///
/// Apart from `id` and `prefix`, every field belongs to some plugin. The
/// core never interprets them; it only stores them and writes them back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Tenant id. Never reassigned.
    pub id: TenantId,

    /// Command prefix. Empty means [`DEFAULT_PREFIX`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub permissions: Map<String, Value>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub archive_role: i64,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub archive_category: i64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled_topic_channels: Vec<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_topic_votes: Vec<Value>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub topic_vote_threshold: i64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topic_vote_emoji: String,

    #[serde(default)]
    pub starboard_config: Map<String, Value>,
}

impl TenantConfig {
    /// Creates the default configuration for a tenant seen for the first time.
    pub fn new(id: TenantId) -> Self {
        Self {
            id,
            prefix: DEFAULT_PREFIX.to_string(),
            permissions: Map::new(),
            archive_role: 0,
            archive_category: 0,
            enabled_topic_channels: Vec::new(),
            active_topic_votes: Vec::new(),
            topic_vote_threshold: 0,
            topic_vote_emoji: String::new(),
            starboard_config: Map::new(),
        }
    }

    /// Sets the prefix after stripping spaces.
    ///
    /// Returns the prefix that was stored, or [`ConfigError::EmptyPrefix`]
    /// without touching `self` when nothing is left.
    pub fn set_prefix(&mut self, raw: &str) -> ConfigResult<String> {
        let prefix = normalize_prefix(raw)?;
        self.prefix.clone_from(&prefix);
        Ok(prefix)
    }

    /// Returns the prefix in effect for this tenant.
    pub fn effective_prefix(&self) -> &str {
        if self.prefix.is_empty() {
            DEFAULT_PREFIX
        } else {
            &self.prefix
        }
    }
}

/// Removes spaces from `raw` and rejects an empty result.
pub fn normalize_prefix(raw: &str) -> ConfigResult<String> {
    let prefix: String = raw.chars().filter(|c| *c != ' ').collect();
    if prefix.is_empty() {
        return Err(ConfigError::EmptyPrefix);
    }
    Ok(prefix)
}

// =============================================================================
// TenantList
// =============================================================================

/// The ordered tenant collection together with its prefix index.
///
/// Entries can only be added or replaced through methods that update the
/// index in the same call, so for every stored tenant `prefix_of(id)`
/// equals that tenant's `prefix`. At most one entry exists per id.
///
/// Serialized as a plain JSON array; the index is rebuilt on
/// deserialization.
#[derive(Debug, Clone, Default)]
pub struct TenantList {
    entries: Vec<TenantConfig>,
    prefix_index: HashMap<TenantId, String>,
}

impl TenantList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot holding `id`.
    ///
    /// Linear in the number of tenants. Every lookup goes through here so
    /// the backing store can become a keyed map without touching callers.
    pub fn position(&self, id: TenantId) -> Option<usize> {
        self.entries.iter().position(|t| t.id == id)
    }

    /// Returns the tenant with `id`.
    pub fn get(&self, id: TenantId) -> Option<&TenantConfig> {
        self.position(id).map(|slot| &self.entries[slot])
    }

    /// Returns the tenant stored at `slot`.
    pub fn at(&self, slot: usize) -> Option<&TenantConfig> {
        self.entries.get(slot)
    }

    /// Replaces the tenant stored at `slot`, keeping the slot's id.
    ///
    /// Returns `false` when `slot` is out of range.
    pub fn replace_at(&mut self, slot: usize, mut tenant: TenantConfig) -> bool {
        let Some(existing) = self.entries.get_mut(slot) else {
            return false;
        };
        tenant.id = existing.id;
        self.prefix_index.insert(tenant.id, tenant.prefix.clone());
        *existing = tenant;
        true
    }

    /// Appends a tenant, or replaces the entry that already has its id.
    pub fn upsert(&mut self, tenant: TenantConfig) {
        match self.position(tenant.id) {
            Some(slot) => {
                self.replace_at(slot, tenant);
            }
            None => {
                self.prefix_index.insert(tenant.id, tenant.prefix.clone());
                self.entries.push(tenant);
            }
        }
    }

    /// Returns the cached prefix of `id`.
    pub fn prefix_of(&self, id: TenantId) -> Option<&str> {
        self.prefix_index.get(&id).map(String::as_str)
    }

    /// Iterates tenants in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TenantConfig> {
        self.entries.iter()
    }

    /// Number of tenants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no tenant is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn rebuild_index(&mut self) {
        self.prefix_index = self
            .entries
            .iter()
            .map(|t| (t.id, t.prefix.clone()))
            .collect();
    }
}

impl From<Vec<TenantConfig>> for TenantList {
    /// Builds a list from raw entries, keeping the first entry per id.
    fn from(raw: Vec<TenantConfig>) -> Self {
        let mut entries: Vec<TenantConfig> = Vec::with_capacity(raw.len());
        for tenant in raw {
            if entries.iter().any(|t| t.id == tenant.id) {
                warn!(tenant = tenant.id, "Duplicate tenant entry ignored");
                continue;
            }
            entries.push(tenant);
        }
        let mut list = Self {
            entries,
            prefix_index: HashMap::new(),
        };
        list.rebuild_index();
        list
    }
}

impl PartialEq for TenantList {
    /// Compares stored entries only; the index is derived.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for TenantList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TenantList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<TenantConfig>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_prefix_strips_spaces() {
        let mut tenant = TenantConfig::new(1);
        assert_eq!(tenant.set_prefix(" ! ? ").unwrap(), "!?");
        assert_eq!(tenant.prefix, "!?");
    }

    #[test]
    fn test_set_prefix_rejects_blank() {
        let mut tenant = TenantConfig::new(1);
        tenant.prefix = "!".into();
        assert_eq!(tenant.set_prefix("   "), Err(ConfigError::EmptyPrefix));
        assert_eq!(tenant.prefix, "!");
    }

    #[test]
    fn test_effective_prefix_falls_back() {
        let mut tenant = TenantConfig::new(1);
        tenant.prefix.clear();
        assert_eq!(tenant.effective_prefix(), DEFAULT_PREFIX);
    }

    #[test]
    fn test_upsert_keeps_one_entry_per_id() {
        let mut list = TenantList::new();
        list.upsert(TenantConfig::new(5));
        let mut changed = TenantConfig::new(5);
        changed.prefix = "$".into();
        list.upsert(changed);

        assert_eq!(list.len(), 1);
        assert_eq!(list.prefix_of(5), Some("$"));
    }

    #[test]
    fn test_replace_at_keeps_slot_id() {
        let mut list = TenantList::from(vec![TenantConfig::new(1)]);
        let mut other = TenantConfig::new(99);
        other.prefix = "?".into();
        assert!(list.replace_at(0, other));

        assert!(list.get(99).is_none());
        assert_eq!(list.get(1).unwrap().prefix, "?");
        assert_eq!(list.prefix_of(1), Some("?"));
        assert!(!list.replace_at(3, TenantConfig::new(3)));
    }

    #[test]
    fn test_deserialize_rebuilds_index_and_drops_duplicates() {
        let json = r#"[
            {"id": 1, "prefix": "!"},
            {"id": 2},
            {"id": 1, "prefix": "?"}
        ]"#;
        let list: TenantList = serde_json::from_str(json).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.prefix_of(1), Some("!"));
        assert_eq!(list.prefix_of(2), Some(""));
    }

    #[test]
    fn test_opaque_documents_round_trip() {
        let json = r#"{"id":7,"prefix":"!","permissions":{"zeta":[1,2],"alpha":{"x":true}},"starboard_config":{"channel":3,"emoji":"star"}}"#;
        let tenant: TenantConfig = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&tenant).unwrap(), json);
    }
}

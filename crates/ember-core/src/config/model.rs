//! Persisted configuration documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::tenant::TenantList;

fn is_zero_u8(v: &u8) -> bool {
    *v == 0
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

/// Root of the configuration tree.
///
/// Only reachable through [`ConfigStore`](super::ConfigStore). The prefix
/// index lives inside [`TenantList`] and is never written to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Credential used to authenticate with the remote service.
    #[serde(default)]
    pub bot_token: String,

    /// Presence text. See [`Presence`](crate::Presence) for placeholders.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub activity_name: String,

    /// Presence URL, only meaningful for streaming presences.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub activity_url: String,

    /// Presence kind, as the numeric value of [`PresenceKind`](crate::PresenceKind).
    #[serde(default, skip_serializing_if = "is_zero_u8")]
    pub activity_type: u8,

    /// Channel that receives operator notices.
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub operator_channel: i64,

    /// Users allowed to run operator-tier commands.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operator_ids: Vec<i64>,

    /// Operator command aliases: alias → canonical command names, run in order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub operator_aliases: BTreeMap<String, Vec<String>>,

    /// Per-tenant configuration.
    #[serde(
        default,
        rename = "guild_configs",
        skip_serializing_if = "TenantList::is_empty"
    )]
    pub tenants: TenantList,
}

/// Which plugins the registry installs on reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSelection {
    /// Plugin names in install order. Overrides the built-in default list
    /// when non-empty.
    #[serde(default)]
    pub loaded_plugins: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TenantConfig;

    fn sample() -> GlobalConfig {
        let mut with_docs = TenantConfig::new(2);
        with_docs.prefix = "!".into();
        with_docs
            .permissions
            .insert("mods".into(), serde_json::json!([10, 11]));
        with_docs.topic_vote_emoji = "🗳".into();

        let mut config = GlobalConfig {
            bot_token: "token".into(),
            activity_name: "USER_USERNAME".into(),
            activity_type: 2,
            operator_ids: vec![1],
            ..Default::default()
        };
        config
            .operator_aliases
            .insert("rl".into(), vec!["reload".into()]);
        config.tenants.upsert(TenantConfig::new(1));
        config.tenants.upsert(with_docs);
        config
    }

    #[test]
    fn test_round_trip_many_tenants() {
        let config = sample();
        let bytes = serde_json::to_vec_pretty(&config).unwrap();
        let decoded: GlobalConfig = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, config);
        assert_eq!(decoded.tenants.prefix_of(2), Some("!"));
    }

    #[test]
    fn test_round_trip_no_tenants() {
        let config = GlobalConfig {
            bot_token: "t".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"bot_token":"t"}"#);
        let decoded: GlobalConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_round_trip_empty_sub_documents() {
        let mut config = GlobalConfig::default();
        config.tenants.upsert(TenantConfig::new(3));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""starboard_config":{}"#));
        let decoded: GlobalConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_selection_defaults_to_empty() {
        let selection: PluginSelection = serde_json::from_str("{}").unwrap();
        assert!(selection.loaded_plugins.is_empty());
    }
}

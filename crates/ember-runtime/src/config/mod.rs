//! Runtime settings: where files live, how often to save and how to log.
//!
//! These are separate from the persisted configuration tree managed by
//! [`ember_core::ConfigStore`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{SettingsError, SettingsResult};
pub use loader::{Profile, SettingsLoader, load_settings};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LoggingConfig, Settings, SpanEventConfig, StorageSettings,
};
pub use validation::validate_settings;

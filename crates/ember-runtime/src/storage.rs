//! Loading and saving the persisted JSON files.
//!
//! Both files are written atomically: the bytes go to a temporary file in
//! the target directory (mode `0o600` on Unix) which is then renamed over
//! the target. Encoding happens under the store's exclusive section; the
//! write happens after it is released.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ember_core::{ConfigStore, GlobalConfig, PluginSelection, SelectionStore};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::config::StorageSettings;
use crate::error::PersistError;

/// Outcome of [`ConfigFiles::save_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub config_saved: bool,
    pub selection_saved: bool,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.config_saved && self.selection_saved
    }
}

/// Locations of the configuration and plugin-selection files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFiles {
    config_path: PathBuf,
    plugin_path: PathBuf,
}

impl ConfigFiles {
    pub fn new(config_path: impl Into<PathBuf>, plugin_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            plugin_path: plugin_path.into(),
        }
    }

    pub fn from_settings(storage: &StorageSettings) -> Self {
        Self::new(&storage.config_file, &storage.plugin_file)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn plugin_path(&self) -> &Path {
        &self.plugin_path
    }

    /// Loads the configuration tree. A missing file is an error.
    pub fn load_config(&self) -> Result<GlobalConfig, PersistError> {
        let config: GlobalConfig = read_json(&self.config_path)?;
        info!(
            path = %self.config_path.display(),
            tenants = config.tenants.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Loads the plugin selection. A missing file yields an empty selection.
    pub fn load_selection(&self) -> Result<PluginSelection, PersistError> {
        match read_json::<PluginSelection>(&self.plugin_path) {
            Ok(selection) => {
                info!(
                    path = %self.plugin_path.display(),
                    plugins = selection.loaded_plugins.len(),
                    "Plugin selection loaded"
                );
                Ok(selection)
            }
            Err(PersistError::Missing(path)) => {
                warn!(path = %path.display(), "Plugin selection file not found, using defaults");
                Ok(PluginSelection::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save_config(&self, store: &ConfigStore) -> Result<(), PersistError> {
        let bytes = store.to_json_pretty().map_err(|source| PersistError::Encode {
            path: self.config_path.clone(),
            source,
        })?;
        write_secure(&self.config_path, &bytes)
    }

    pub fn save_selection(&self, store: &SelectionStore) -> Result<(), PersistError> {
        let bytes = store.to_json_pretty().map_err(|source| PersistError::Encode {
            path: self.plugin_path.clone(),
            source,
        })?;
        write_secure(&self.plugin_path, &bytes)
    }

    /// Saves both files. A failure of one does not prevent the other.
    pub fn save_all(&self, config: &ConfigStore, selection: &SelectionStore) -> SaveReport {
        let config_saved = match self.save_config(config) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to save configuration");
                false
            }
        };
        let selection_saved = match self.save_selection(selection) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to save plugin selection");
                false
            }
        };
        let report = SaveReport {
            config_saved,
            selection_saved,
        };
        if report.is_complete() {
            info!(
                config = %self.config_path.display(),
                plugins = %self.plugin_path.display(),
                "Configuration saved"
            );
        }
        report
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            PersistError::Missing(path.to_path_buf())
        } else {
            PersistError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_slice(&bytes).map_err(|source| PersistError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Atomically replaces `path` with `content`, readable by the owner only.
fn write_secure(path: &Path, content: &[u8]) -> Result<(), PersistError> {
    let write_err = |source: io::Error| PersistError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(write_err)?;
    }
    tmp.write_all(content).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), bytes = content.len(), "File written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    fn files(dir: &TempDir) -> ConfigFiles {
        ConfigFiles::new(
            dir.path().join("config/config.json"),
            dir.path().join("config/plugins.json"),
        )
    }

    #[test]
    fn test_missing_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = files(&dir).load_config().unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_corrupt_config_fails_to_parse() {
        let dir = TempDir::new().unwrap();
        let files = files(&dir);
        std::fs::create_dir_all(files.config_path().parent().unwrap()).unwrap();
        std::fs::write(files.config_path(), b"{ not json").unwrap();
        assert!(matches!(files.load_config(), Err(PersistError::Parse { .. })));
    }

    #[test]
    fn test_missing_selection_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        let selection = assert_ok!(files(&dir).load_selection());
        assert!(selection.loaded_plugins.is_empty());
    }

    #[test]
    fn test_corrupt_selection_is_fatal() {
        let dir = TempDir::new().unwrap();
        let files = files(&dir);
        std::fs::create_dir_all(files.plugin_path().parent().unwrap()).unwrap();
        std::fs::write(files.plugin_path(), b"[1, 2").unwrap();
        assert_err!(files.load_selection());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let files = files(&dir);

        let raw = json!({
            "bot_token": "secret",
            "operator_ids": [7],
            "guild_configs": [
                {"id": 42, "prefix": "!", "starboard_config": {"z": 1, "a": [true]}},
                {"id": 43, "starboard_config": {}}
            ]
        });
        let config: GlobalConfig = serde_json::from_value(raw).unwrap();
        let store = ConfigStore::new(config.clone());
        let selection = SelectionStore::new(PluginSelection {
            loaded_plugins: vec!["base".to_string()],
        });

        let report = files.save_all(&store, &selection);
        assert!(report.is_complete());

        assert_eq!(files.load_config().unwrap(), config);
        assert_eq!(files.load_selection().unwrap().loaded_plugins, vec!["base"]);

        let text = std::fs::read_to_string(files.config_path()).unwrap();
        assert!(text.find("\"z\"").unwrap() < text.find("\"a\"").unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let files = files(&dir);
        assert!(files.save_all(&ConfigStore::default(), &SelectionStore::default()).is_complete());

        for path in [files.config_path(), files.plugin_path()] {
            let mode = std::fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{}", path.display());
        }
    }

    #[test]
    fn test_one_failed_save_does_not_block_the_other() {
        let dir = TempDir::new().unwrap();
        // a directory where the config file should be makes the rename fail
        let config_path = dir.path().join("config.json");
        std::fs::create_dir_all(config_path.join("occupied")).unwrap();
        let files = ConfigFiles::new(&config_path, dir.path().join("plugins.json"));

        let report = files.save_all(&ConfigStore::default(), &SelectionStore::default());
        assert!(!report.config_saved);
        assert!(report.selection_saved);
        assert!(files.plugin_path().exists());
    }
}

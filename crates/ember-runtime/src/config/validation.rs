//! Settings validation.

use super::error::{SettingsError, SettingsResult};
use super::schema::{LogOutput, Settings};

/// Validates loaded settings.
pub fn validate_settings(settings: &Settings) -> SettingsResult<()> {
    if settings.save_interval_secs == 0 {
        return Err(SettingsError::invalid("save_interval_secs must be greater than 0"));
    }

    if settings.logging.output == LogOutput::File && settings.logging.file_path.is_none() {
        return Err(SettingsError::invalid(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    let storage = &settings.storage;
    if storage.config_file.as_os_str().is_empty() || storage.plugin_file.as_os_str().is_empty() {
        return Err(SettingsError::invalid("storage paths must not be empty"));
    }
    if storage.config_file == storage.plugin_file {
        return Err(SettingsError::invalid(
            "storage.config_file and storage.plugin_file must differ",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_ok!(validate_settings(&Settings::default()));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let settings = Settings {
            save_interval_secs: 0,
            ..Default::default()
        };
        assert_err!(validate_settings(&settings));
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut settings = Settings::default();
        settings.logging.output = LogOutput::File;
        assert_err!(validate_settings(&settings));

        settings.logging.file_path = Some(PathBuf::from("logs/ember.log"));
        assert_ok!(validate_settings(&settings));
    }

    #[test]
    fn test_same_storage_paths_rejected() {
        let mut settings = Settings::default();
        settings.storage.plugin_file = settings.storage.config_file.clone();
        assert!(matches!(validate_settings(&settings), Err(SettingsError::Invalid(_))));
    }
}

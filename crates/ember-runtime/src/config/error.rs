//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading runtime settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// An explicitly requested settings file does not exist.
    #[error("settings file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The sources could not be merged or extracted.
    #[error("failed to load settings: {0}")]
    Parse(String),

    /// A value is out of range.
    #[error("invalid settings: {0}")]
    Invalid(String),
}

impl SettingsError {
    /// Creates a validation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

//! Runtime error types.

use std::io;
use std::path::PathBuf;

use ember_core::TransportError;
use thiserror::Error;

use crate::config::SettingsError;

/// Errors from loading or saving the persisted files.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The file does not exist.
    #[error("file not found: {}", .0.display())]
    Missing(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON for its schema.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory value could not be encoded.
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PersistError {
    /// Returns `true` if the file simply does not exist.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }
}

/// Errors that stop the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Runtime settings could not be loaded.
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// A persisted file could not be loaded.
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),

    /// The configuration has no bot credential.
    #[error("bot_token is empty; set it in the configuration file")]
    MissingCredential,

    /// The transport failed to connect.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// `run` was called on a runtime that already ran.
    #[error("runtime already started")]
    AlreadyStarted,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

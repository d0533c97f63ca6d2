//! Error types shared by the core layer.
//!
//! Configuration errors are *validation* errors: they describe what was
//! wrong with a caller's input and are meant to be shown to the end user.
//! Collaborator errors (scheduler, transport) are operator-facing only.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Validation errors raised by config mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The requested prefix was empty once spaces were removed.
    #[error("prefix is empty")]
    EmptyPrefix,

    /// A presence kind outside the known range was configured.
    #[error("unknown presence kind: {0}")]
    UnknownPresenceKind(u8),

    /// Generic validation failure raised by a plugin-level mutation.
    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates a generic validation error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Result type for config mutations.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Scheduler Errors
// =============================================================================

/// Errors returned by a [`Scheduler`](crate::Scheduler) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// No job is registered under the tag.
    #[error("no job tagged '{0}'")]
    NotFound(String),

    /// The scheduler refused the job.
    #[error("job '{tag}' rejected: {reason}")]
    Rejected {
        /// Tag of the rejected job.
        tag: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The scheduler has been shut down.
    #[error("scheduler is shut down")]
    ShutDown,
}

impl SchedulerError {
    /// Creates a rejection error.
    pub fn rejected(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connecting to the remote service failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The connection is closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

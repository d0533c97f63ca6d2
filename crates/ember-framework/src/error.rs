//! Error types for the Ember framework.

use ember_core::ConfigError;
use thiserror::Error;

/// Returned by a plugin whose registration callback could not complete.
///
/// The registry logs it and moves on to the next plugin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// The plugin refused to register.
    #[error("registration failed: {0}")]
    Registration(String),

    /// No plugin with this name is known to the catalog.
    #[error("plugin '{0}' is not available")]
    NotFound(String),

    /// The registration callback panicked.
    #[error("registration panicked: {0}")]
    Panicked(String),
}

impl PluginError {
    /// Creates a registration failure.
    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }
}

/// Errors returned by command and responder handlers.
///
/// Everything except [`CommandError::Internal`] describes a problem with
/// the user's input and is sent back to them as a reply. Internal errors
/// are only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The input was rejected by the handler.
    #[error("{0}")]
    Invalid(String),

    /// A config mutation rejected the input.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A positional argument was not given.
    #[error("argument {position} is missing")]
    MissingArgument {
        /// 1-based position of the argument.
        position: usize,
    },

    /// The command needs operator rights.
    #[error("`{command}` is restricted to operators")]
    PermissionDenied {
        /// Name the command was invoked as.
        command: String,
    },

    /// The command only works inside a tenant.
    #[error("`{command}` can only be used inside a server")]
    TenantRequired {
        /// Name the command was invoked as.
        command: String,
    },

    /// The handler failed for reasons unrelated to the input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CommandError {
    /// Creates an input validation error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns `true` if the error should be shown to the user.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

/// Result of a command or responder handler: an optional reply.
pub type CommandResult = Result<Option<String>, CommandError>;

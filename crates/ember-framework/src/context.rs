//! Contexts handed to command and responder handlers.

use std::ops::Deref;
use std::sync::Arc;

use ember_core::{ConfigStore, InboundEvent, TenantId};

use crate::error::CommandError;
use crate::registry::Registry;

/// Everything a handler can reach while processing one event.
///
/// Handlers run outside every exclusive section, so they may freely call
/// into the config store or trigger a registry reload.
#[derive(Clone)]
pub struct Context {
    /// The event being handled.
    pub event: InboundEvent,
    /// The shared configuration tree.
    pub config: Arc<ConfigStore>,
    /// The plugin registry.
    pub registry: Arc<Registry>,
}

impl Context {
    /// Returns the tenant the event belongs to.
    pub fn tenant(&self) -> Option<TenantId> {
        self.event.tenant
    }

    /// Returns the tenant, or an error naming `command` for direct messages.
    pub fn require_tenant(&self, command: &str) -> Result<TenantId, CommandError> {
        self.event.tenant.ok_or_else(|| CommandError::TenantRequired {
            command: command.to_string(),
        })
    }

    /// Returns `true` if the author is an operator.
    pub fn is_operator(&self) -> bool {
        self.config.is_operator(self.event.author)
    }
}

/// Context for a command invocation.
#[derive(Clone)]
pub struct CommandContext {
    base: Context,
    /// Name the command was invoked as (lower-cased).
    pub name: String,
    /// Whitespace-separated arguments after the name.
    pub args: Vec<String>,
}

impl CommandContext {
    pub(crate) fn new(base: Context, name: String, args: Vec<String>) -> Self {
        Self { base, name, args }
    }

    /// Returns the argument at 1-based `position`.
    pub fn arg(&self, position: usize) -> Result<&str, CommandError> {
        position
            .checked_sub(1)
            .and_then(|i| self.args.get(i))
            .map(String::as_str)
            .ok_or(CommandError::MissingArgument { position })
    }

    /// Returns all arguments joined by single spaces.
    pub fn rest(&self) -> String {
        self.args.join(" ")
    }
}

impl Deref for CommandContext {
    type Target = Context;

    fn deref(&self) -> &Context {
        &self.base
    }
}

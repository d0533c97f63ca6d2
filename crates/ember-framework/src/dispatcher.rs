//! Routes inbound events to commands and responders.
//!
//! For each event the dispatcher:
//!
//! 1. Reads the tenant's prefix from the prefix cache.
//! 2. If the text starts with it, resolves the command by name or alias,
//!    then (for operators only) through `operator_aliases`.
//! 3. Otherwise offers the event to every responder whose predicate matches.
//!
//! Responders never see a message that resolved to a command, even when
//! their predicate would match it.
//!
//! Handlers run against a snapshot of the registry taken at the start of
//! dispatch, outside every exclusive section.

use std::sync::Arc;

use ember_core::{ConfigStore, InboundEvent};
use tracing::{debug, error};

use crate::command::{CommandDescriptor, PermissionTier, parse_invocation};
use crate::context::{CommandContext, Context};
use crate::error::{CommandError, CommandResult};
use crate::registry::Registry;

/// What happened to one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Name the resolved command was invoked as.
    pub command: Option<String>,
    /// Number of responders that ran.
    pub responders: usize,
    /// Replies to send back, in order.
    pub replies: Vec<String>,
}

impl DispatchOutcome {
    /// Returns `true` if nothing handled the event.
    pub fn is_unhandled(&self) -> bool {
        self.command.is_none() && self.responders == 0
    }
}

/// Routes events to the registry's active handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: Arc<ConfigStore>,
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(config: Arc<ConfigStore>, registry: Arc<Registry>) -> Self {
        Self { config, registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Handles one event and collects the replies.
    pub async fn dispatch(&self, event: &InboundEvent) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let active = self.registry.snapshot();
        let base = Context {
            event: event.clone(),
            config: self.config.clone(),
            registry: self.registry.clone(),
        };

        let prefix = self.config.prefix_for(event.tenant);
        if let Some(inv) = parse_invocation(&prefix, &event.content) {
            if let Some(cmd) = active.find_command(&inv.name) {
                let ctx = CommandContext::new(base, inv.name.clone(), inv.args);
                let result = self.run_command(cmd, ctx).await;
                self.collect(&inv.name, result, &mut outcome.replies);
                outcome.command = Some(inv.name);
                return outcome;
            }

            if base.is_operator()
                && let Some(targets) = self.config.operator_alias(&inv.name)
            {
                debug!(alias = %inv.name, targets = ?targets, "Expanding operator alias");
                for target in &targets {
                    let Some(cmd) = active.find_command(target) else {
                        debug!(alias = %inv.name, command = %target, "Alias target is not active");
                        continue;
                    };
                    let ctx = CommandContext::new(base.clone(), target.to_lowercase(), inv.args.clone());
                    let result = self.run_command(cmd, ctx).await;
                    self.collect(target, result, &mut outcome.replies);
                }
                outcome.command = Some(inv.name);
                return outcome;
            }
        }

        for responder in active.responders().iter().filter(|r| r.wants(event)) {
            outcome.responders += 1;
            let result = responder.invoke(base.clone()).await;
            self.collect(responder.name(), result, &mut outcome.replies);
        }
        outcome
    }

    async fn run_command(&self, cmd: &CommandDescriptor, ctx: CommandContext) -> CommandResult {
        if cmd.tier() == PermissionTier::Operator && !ctx.is_operator() {
            return Err(CommandError::PermissionDenied { command: ctx.name.clone() });
        }
        cmd.invoke(ctx).await
    }

    fn collect(&self, handler: &str, result: CommandResult, replies: &mut Vec<String>) {
        match result {
            Ok(Some(reply)) => replies.push(reply),
            Ok(None) => {}
            Err(e) if e.is_user_facing() => replies.push(format!("Error: {e}")),
            Err(e) => error!(handler, error = %e, "Handler failed"),
        }
    }
}

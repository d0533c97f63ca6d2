//! Command descriptors and invocation parsing.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::context::CommandContext;
use crate::error::CommandResult;

/// Async command handler.
pub type CommandHandler = Arc<dyn Fn(CommandContext) -> BoxFuture<'static, CommandResult> + Send + Sync>;

/// Who may run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionTier {
    /// Anyone.
    #[default]
    Everyone,
    /// Only users listed in `operator_ids`.
    Operator,
}

/// A command contributed by a plugin.
///
/// # Example
///
/// ```rust
/// use ember_framework::command::{CommandDescriptor, PermissionTier};
///
/// let ping = CommandDescriptor::new("ping", |_ctx| async { Ok(Some("Pong!".to_string())) })
///     .alias("p")
///     .help("Replies with Pong!");
/// assert!(ping.matches("P"));
/// assert_eq!(ping.tier(), PermissionTier::Everyone);
/// ```
#[derive(Clone)]
pub struct CommandDescriptor {
    name: String,
    aliases: Vec<String>,
    help: String,
    tier: PermissionTier,
    handler: CommandHandler,
}

impl CommandDescriptor {
    /// Creates a command named `name` handled by `handler`.
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult> + Send + 'static,
    {
        Self {
            name: name.into().to_lowercase(),
            aliases: Vec::new(),
            help: String::new(),
            tier: PermissionTier::Everyone,
            handler: Arc::new(move |ctx| Box::pin(handler(ctx))),
        }
    }

    /// Adds an alternative name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_lowercase());
        self
    }

    /// Sets the help text.
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = text.into();
        self
    }

    /// Restricts the command to operators.
    pub fn operator_only(mut self) -> Self {
        self.tier = PermissionTier::Operator;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn tier(&self) -> PermissionTier {
        self.tier
    }

    /// Returns `true` if `name` is this command's name or one of its aliases.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.name == name || self.aliases.iter().any(|a| *a == name)
    }

    /// Runs the handler.
    pub async fn invoke(&self, ctx: CommandContext) -> CommandResult {
        (self.handler)(ctx).await
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

/// A command name and its arguments, parsed from message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
}

/// Parses `content` as a command invocation under `prefix`.
///
/// Returns `None` when the text does not start with the prefix or nothing
/// follows it. The name is lower-cased; arguments are split on whitespace.
pub fn parse_invocation(prefix: &str, content: &str) -> Option<Invocation> {
    if prefix.is_empty() {
        return None;
    }
    let rest = content.strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    // "! ping" is not an invocation
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = words.next()?.to_lowercase();
    Some(Invocation {
        name,
        args: words.map(str::to_string).collect(),
    })
}

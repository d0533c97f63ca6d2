//! Passive responders: handlers that react to ordinary messages.

use std::fmt;
use std::sync::Arc;

use ember_core::InboundEvent;
use futures::future::BoxFuture;

use crate::context::Context;
use crate::error::CommandResult;

/// Decides whether a responder wants an event.
pub type ResponderMatch = Arc<dyn Fn(&InboundEvent) -> bool + Send + Sync>;

/// Async responder handler.
pub type ResponderHandler = Arc<dyn Fn(Context) -> BoxFuture<'static, CommandResult> + Send + Sync>;

/// A responder contributed by a plugin.
#[derive(Clone)]
pub struct ResponderDescriptor {
    name: String,
    matcher: ResponderMatch,
    handler: ResponderHandler,
}

impl ResponderDescriptor {
    /// Creates a responder that runs `handler` for events accepted by `matcher`.
    pub fn new<M, F, Fut>(name: impl Into<String>, matcher: M, handler: F) -> Self
    where
        M: Fn(&InboundEvent) -> bool + Send + Sync + 'static,
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            matcher: Arc::new(matcher),
            handler: Arc::new(move |ctx| Box::pin(handler(ctx))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the responder wants `event`.
    pub fn wants(&self, event: &InboundEvent) -> bool {
        (self.matcher)(event)
    }

    /// Runs the handler.
    pub async fn invoke(&self, ctx: Context) -> CommandResult {
        (self.handler)(ctx).await
    }
}

impl fmt::Debug for ResponderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponderDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

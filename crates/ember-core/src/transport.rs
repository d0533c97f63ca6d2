//! Interface to the network transport.
//!
//! The transport owns the connection to the remote service. It hands every
//! inbound message to an [`EventSink`] and sends replies on request; it
//! knows nothing about prefixes, commands or plugins.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::event::{BotUser, InboundEvent};
use crate::presence::RenderedPresence;

/// Callback the transport invokes for each inbound event.
pub type EventSink = Arc<dyn Fn(InboundEvent) + Send + Sync>;

/// Connection to the remote service.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Connects using `credential` and starts delivering events to `sink`.
    ///
    /// Returns the account the bot is logged in as.
    async fn open(&self, credential: &str, sink: EventSink) -> TransportResult<BotUser>;

    /// Sends `text` in reply to `event`.
    async fn send(&self, event: &InboundEvent, text: &str) -> TransportResult<()>;

    /// Updates the bot's presence. The default does nothing.
    async fn set_presence(&self, _presence: &RenderedPresence) -> TransportResult<()> {
        Ok(())
    }

    /// Stops delivering events and disconnects.
    async fn close(&self) -> TransportResult<()>;
}

//! Inbound events delivered by the transport.

use crate::config::TenantId;

/// A text message received from the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Tenant the message was sent in. `None` for direct messages.
    pub tenant: Option<TenantId>,
    /// Channel the message was sent in.
    pub channel: i64,
    /// Author of the message.
    pub author: i64,
    /// Raw message text.
    pub content: String,
}

impl InboundEvent {
    /// Creates a message event in `tenant`.
    pub fn new(tenant: Option<TenantId>, channel: i64, author: i64, content: impl Into<String>) -> Self {
        Self {
            tenant,
            channel,
            author,
            content: content.into(),
        }
    }

    /// Returns `true` for direct messages.
    pub fn is_direct(&self) -> bool {
        self.tenant.is_none()
    }
}

/// The account the bot is logged in as.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BotUser {
    pub id: i64,
    pub username: String,
    pub discriminator: String,
}

impl BotUser {
    /// Returns `username#discriminator`, or just the username when the
    /// discriminator is empty or `"0"`.
    pub fn tag(&self) -> String {
        if self.discriminator.is_empty() || self.discriminator == "0" {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }
}

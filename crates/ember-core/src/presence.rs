//! Bot presence shown by the remote service.

use std::fmt;

use crate::error::{ConfigError, ConfigResult};
use crate::event::BotUser;

/// What the bot is shown as doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PresenceKind {
    #[default]
    Playing = 0,
    Streaming = 1,
    Listening = 2,
    Watching = 3,
    Custom = 4,
    Competing = 5,
}

impl TryFrom<u8> for PresenceKind {
    type Error = ConfigError;

    fn try_from(value: u8) -> ConfigResult<Self> {
        Ok(match value {
            0 => Self::Playing,
            1 => Self::Streaming,
            2 => Self::Listening,
            3 => Self::Watching,
            4 => Self::Custom,
            5 => Self::Competing,
            other => return Err(ConfigError::UnknownPresenceKind(other)),
        })
    }
}

impl fmt::Display for PresenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Playing => "playing",
            Self::Streaming => "streaming",
            Self::Listening => "listening",
            Self::Watching => "watching",
            Self::Custom => "custom",
            Self::Competing => "competing",
        };
        f.write_str(name)
    }
}

/// Presence as stored in the config tree.
///
/// `name` may contain the placeholders `USER_ID`, `USER_TAG` and
/// `USER_USERNAME`, substituted by [`render`](Self::render) once the bot
/// knows who it is logged in as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    pub name: String,
    pub url: String,
    pub kind: u8,
}

/// Presence ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPresence {
    pub name: String,
    pub url: String,
    pub kind: PresenceKind,
}

impl Presence {
    /// Returns `true` if no presence is configured.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Substitutes placeholders for `user` and validates the kind.
    pub fn render(&self, user: &BotUser) -> ConfigResult<RenderedPresence> {
        let name = self
            .name
            .replace("USER_ID", &user.id.to_string())
            .replace("USER_TAG", &user.tag())
            .replace("USER_USERNAME", &user.username);

        Ok(RenderedPresence {
            name,
            url: self.url.clone(),
            kind: PresenceKind::try_from(self.kind)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> BotUser {
        BotUser {
            id: 123,
            username: "ember".into(),
            discriminator: "0042".into(),
        }
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let presence = Presence {
            name: "USER_USERNAME (USER_TAG) #USER_ID".into(),
            url: String::new(),
            kind: 2,
        };
        let rendered = presence.render(&user()).unwrap();
        assert_eq!(rendered.name, "ember (ember#0042) #123");
        assert_eq!(rendered.kind, PresenceKind::Listening);
    }

    #[test]
    fn test_render_rejects_unknown_kind() {
        let presence = Presence {
            name: "x".into(),
            url: String::new(),
            kind: 9,
        };
        assert_eq!(
            presence.render(&user()),
            Err(ConfigError::UnknownPresenceKind(9))
        );
    }
}

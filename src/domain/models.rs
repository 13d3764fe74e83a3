//! Domain models for fetched Discord data.
//!
//! These are snapshots of remote state: a channel listed here may be gone or
//! unreadable by the time it is fetched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder rendered for messages without body text.
pub const NO_TEXT_PLACEHOLDER: &str = "[No text content]";

/// Kind of conversation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    /// One-to-one conversation.
    Direct,
    /// Group conversation outside any guild.
    Group,
    /// Text-capable channel inside a guild.
    GuildText,
}

impl ChannelKind {
    /// Maps a remote channel type code onto a supported kind.
    ///
    /// Voice, category, forum, stage and thread codes yield `None`.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 | 5 => Some(Self::GuildText),
            1 => Some(Self::Direct),
            3 => Some(Self::Group),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "DM"),
            Self::Group => write!(f, "Group DM"),
            Self::GuildText => write!(f, "Text"),
        }
    }
}

/// Name/id back-reference from a channel to its guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRef {
    pub id: String,
    pub name: String,
}

/// A conversation surface the session can (or could) read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Opaque channel identifier.
    pub id: String,
    /// Display name (synthesized for direct conversations).
    pub name: String,
    pub kind: ChannelKind,
    /// Parent guild, for guild channels.
    #[serde(default)]
    pub guild: Option<GuildRef>,
}

impl Channel {
    /// Human-readable label used for display and export headers.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.guild {
            Some(guild) => format!("#{} (from {})", self.name, guild.name),
            None => self.name.clone(),
        }
    }
}

/// A guild together with the text channels that could be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    pub channels: Vec<Channel>,
}

/// Point-in-time snapshot of reachable channels.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Directory {
    pub direct_channels: Vec<Channel>,
    pub guilds: BTreeMap<String, Guild>,
}

impl Directory {
    /// Total number of listed channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.direct_channels.len()
            + self.guilds.values().map(|g| g.channels.len()).sum::<usize>()
    }
}

/// The identity bound to the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

/// Message author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Author {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
}

impl Author {
    /// `username#discriminator`, with `0` for accounts on the new handle system.
    #[must_use]
    pub fn qualified_handle(&self) -> String {
        format!(
            "{}#{}",
            self.username,
            self.discriminator.as_deref().unwrap_or("0")
        )
    }
}

/// File attached to a message. Only the URL is kept, never the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

impl Attachment {
    /// `filename (url)`
    #[must_use]
    pub fn descriptor(&self) -> String {
        format!("{} ({})", self.filename, self.url)
    }
}

/// A single message with a parsed timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque id, also used as the pagination cursor.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub author: Author,
    /// Body text; `None` when the message carries none.
    pub content: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Remaining remote fields (embeds, reactions, ...) passed through as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Body text or the explicit placeholder.
    #[must_use]
    pub fn body(&self) -> &str {
        self.content.as_deref().unwrap_or(NO_TEXT_PLACEHOLDER)
    }
}

/// Assembled, deduplicated and oldest-first message set.
#[derive(Debug, Clone)]
pub struct FetchResult {
    channel_id: String,
    requested: usize,
    messages: Vec<Message>,
    dropped: usize,
}

impl FetchResult {
    #[must_use]
    pub const fn new(
        channel_id: String,
        requested: usize,
        messages: Vec<Message>,
        dropped: usize,
    ) -> Self {
        Self {
            channel_id,
            requested,
            messages,
            dropped,
        }
    }

    #[must_use]
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Count the caller asked for.
    #[must_use]
    pub const fn requested(&self) -> usize {
        self.requested
    }

    /// Messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Records dropped because they could not be parsed.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str, name: &str, guild: Option<GuildRef>) -> Channel {
        Channel {
            id: id.into(),
            name: name.into(),
            kind: if guild.is_some() {
                ChannelKind::GuildText
            } else {
                ChannelKind::Direct
            },
            guild,
        }
    }

    #[test]
    fn test_channel_kind_codes() {
        assert_eq!(ChannelKind::from_code(0), Some(ChannelKind::GuildText));
        assert_eq!(ChannelKind::from_code(5), Some(ChannelKind::GuildText));
        assert_eq!(ChannelKind::from_code(1), Some(ChannelKind::Direct));
        assert_eq!(ChannelKind::from_code(3), Some(ChannelKind::Group));
        assert_eq!(ChannelKind::from_code(2), None);
        assert_eq!(ChannelKind::from_code(4), None);
        assert_eq!(ChannelKind::from_code(15), None);
    }

    #[test]
    fn test_channel_label() {
        let guild = GuildRef {
            id: "g1".into(),
            name: "Rustaceans".into(),
        };
        assert_eq!(
            channel("c1", "general", Some(guild)).label(),
            "#general (from Rustaceans)"
        );
        assert_eq!(channel("c2", "DM with ferris", None).label(), "DM with ferris");
    }

    #[test]
    fn test_directory_channel_count() {
        let mut directory = Directory::default();
        directory
            .direct_channels
            .push(channel("d1", "DM with ferris", None));
        directory.guilds.insert(
            "g1".into(),
            Guild {
                id: "g1".into(),
                name: "Rustaceans".into(),
                channels: vec![channel(
                    "c1",
                    "general",
                    Some(GuildRef {
                        id: "g1".into(),
                        name: "Rustaceans".into(),
                    }),
                )],
            },
        );

        assert_eq!(directory.channel_count(), 2);
    }

    #[test]
    fn test_qualified_handle() {
        let mut author = Author {
            id: "1".into(),
            username: "ferris".into(),
            discriminator: Some("1234".into()),
            global_name: None,
        };
        assert_eq!(author.qualified_handle(), "ferris#1234");
        author.discriminator = None;
        assert_eq!(author.qualified_handle(), "ferris#0");
    }
}

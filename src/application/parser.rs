//! JSON parsing for Discord API payloads.
//!
//! Handles conversion from raw API values to domain models.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{
    AppError, Attachment, Author, Channel, ChannelKind, GuildRef, Message, Result,
};

/// User object as returned by the API.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAttachment {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub url: String,
}

/// Message object as returned by the API.
///
/// Only `id` is required: it is the pagination cursor. Everything else is
/// validated per message by [`parse_message`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub author: Option<RawUser>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub attachments: Vec<RawAttachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Channel object as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawChannel {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub recipients: Vec<RawUser>,
}

/// Partial guild object from `/users/@me/guilds`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGuild {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One page of messages, newest first as delivered.
#[derive(Debug, Clone, Default)]
pub struct MessageBatch {
    pub messages: Vec<RawMessage>,
    /// Elements of the page that were not message objects.
    pub rejected: usize,
}

impl MessageBatch {
    /// Decodes a page payload element by element.
    ///
    /// # Errors
    /// Returns error if the payload is not an array.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let (messages, rejected) = decode_each(payload)?;
        Ok(Self { messages, rejected })
    }

    /// Elements received, rejected ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len() + self.rejected
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id of the oldest decodable message, the next cursor.
    #[must_use]
    pub fn oldest_id(&self) -> Option<&str> {
        self.messages.last().map(|m| m.id.as_str())
    }
}

/// Decodes an API payload into a typed value.
///
/// # Errors
/// Returns error if the payload does not match `T`.
pub fn decode<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(AppError::json_parse)
}

/// Decodes an array payload one element at a time.
///
/// Returns the decoded elements and the number that did not match `T`.
///
/// # Errors
/// Returns error if the payload is not an array.
pub fn decode_each<T: DeserializeOwned>(payload: Value) -> Result<(Vec<T>, usize)> {
    let elements: Vec<Value> = decode(payload)?;
    let mut decoded = Vec::with_capacity(elements.len());
    let mut rejected = 0;

    for element in elements {
        match serde_json::from_value(element) {
            Ok(value) => decoded.push(value),
            Err(e) => {
                rejected += 1;
                tracing::warn!("Skipping malformed record: {e}");
            }
        }
    }

    Ok((decoded, rejected))
}

/// Converts a raw message into a domain message.
///
/// # Errors
/// Returns `Data` if the timestamp cannot be parsed or the author is missing.
pub fn parse_message(raw: RawMessage) -> Result<Message> {
    let stamp = raw.timestamp.as_deref().unwrap_or_default();
    let timestamp = parse_datetime(stamp).ok_or_else(|| AppError::Data {
        message: format!(
            "message {} has unparsable timestamp {stamp:?}",
            raw.id
        ),
    })?;

    let author = raw.author.ok_or_else(|| AppError::Data {
        message: format!("message {} has no author", raw.id),
    })?;

    let content = raw.content.filter(|c| !c.is_empty());

    Ok(Message {
        id: raw.id,
        timestamp,
        author: Author {
            id: author.id,
            username: author.username,
            discriminator: author.discriminator,
            global_name: author.global_name,
        },
        content,
        attachments: raw
            .attachments
            .into_iter()
            .map(|a| Attachment {
                filename: a.filename,
                url: a.url,
            })
            .collect(),
        extra: raw.extra,
    })
}

/// Builds a direct or group conversation from a `/users/@me/channels` entry.
///
/// One-to-one conversations without a recipient and non-conversation kinds
/// yield `None`.
#[must_use]
pub fn parse_direct_channel(raw: RawChannel) -> Option<Channel> {
    let kind = ChannelKind::from_code(raw.kind)?;

    let name = match kind {
        ChannelKind::Direct => {
            let recipient = raw.recipients.first()?;
            let handle = if recipient.username.is_empty() {
                "Unknown"
            } else {
                recipient.username.as_str()
            };
            format!("DM with {handle}")
        }
        ChannelKind::Group => raw
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Group with {} members", raw.recipients.len())),
        ChannelKind::GuildText => return None,
    };

    Some(Channel {
        id: raw.id,
        name,
        kind,
        guild: None,
    })
}

/// Builds a guild channel, keeping text-capable kinds only.
#[must_use]
pub fn parse_guild_channel(raw: RawChannel, guild: &GuildRef) -> Option<Channel> {
    match ChannelKind::from_code(raw.kind) {
        Some(ChannelKind::GuildText) => Some(Channel {
            name: raw.name.unwrap_or_else(|| raw.id.clone()),
            id: raw.id,
            kind: ChannelKind::GuildText,
            guild: Some(guild.clone()),
        }),
        _ => None,
    }
}

/// Parses an ISO 8601 timestamp with offset.
fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    value.parse::<DateTime<Utc>>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_channel(value: Value) -> RawChannel {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_datetime_api_format() {
        assert!(parse_datetime("2024-03-01T12:30:45.123000+00:00").is_some());
        assert!(parse_datetime("2024-03-01T12:30:45Z").is_some());
        assert!(parse_datetime("yesterday").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_parse_message_keeps_passthrough_fields() {
        let raw: RawMessage = serde_json::from_value(json!({
            "id": "10",
            "timestamp": "2024-03-01T12:30:45.123000+00:00",
            "content": "",
            "author": {"id": "1", "username": "ferris", "discriminator": "0"},
            "attachments": [{"filename": "a.png", "url": "https://cdn/a.png", "size": 3}],
            "embeds": [{"title": "link"}],
            "reactions": [{"count": 2}]
        }))
        .unwrap();

        let message = parse_message(raw).unwrap();

        assert_eq!(message.id, "10");
        assert_eq!(message.content, None);
        assert_eq!(message.body(), "[No text content]");
        assert_eq!(message.attachments[0].descriptor(), "a.png (https://cdn/a.png)");
        assert!(message.extra.contains_key("embeds"));
        assert!(message.extra.contains_key("reactions"));
    }

    #[test]
    fn test_parse_message_rejects_bad_timestamp() {
        let raw: RawMessage = serde_json::from_value(json!({
            "id": "11",
            "timestamp": "not-a-time",
            "author": {"id": "1", "username": "ferris"}
        }))
        .unwrap();

        assert!(matches!(parse_message(raw), Err(AppError::Data { .. })));
    }

    #[test]
    fn test_batch_requires_message_ids() {
        let batch = MessageBatch::from_payload(json!([{"id": "3"}, {"id": "2"}])).unwrap();
        assert_eq!(batch.oldest_id(), Some("2"));

        assert!(MessageBatch::from_payload(json!({"message": "oops"})).is_err());
    }

    #[test]
    fn test_batch_rejects_only_malformed_elements() {
        let batch = MessageBatch::from_payload(json!([
            {"id": "4"},
            {"content": "no id"},
            {"id": "3", "timestamp": 1_700_000_000},
            {"id": "2"},
            "not an object"
        ]))
        .unwrap();

        assert_eq!(batch.messages.len(), 2);
        assert_eq!(batch.rejected, 3);
        assert_eq!(batch.len(), 5);
        assert_eq!(batch.oldest_id(), Some("2"));

        let only_bad = MessageBatch::from_payload(json!([{"content": "no id"}])).unwrap();
        assert!(!only_bad.is_empty());
        assert_eq!(only_bad.oldest_id(), None);
    }

    #[test]
    fn test_direct_channel_names() {
        let dm = parse_direct_channel(raw_channel(json!({
            "id": "1", "type": 1,
            "recipients": [{"id": "9", "username": "ferris"}]
        })))
        .unwrap();
        assert_eq!(dm.name, "DM with ferris");
        assert_eq!(dm.kind, ChannelKind::Direct);

        let named_group = parse_direct_channel(raw_channel(json!({
            "id": "2", "type": 3, "name": "crabs",
            "recipients": [{"username": "a"}, {"username": "b"}]
        })))
        .unwrap();
        assert_eq!(named_group.name, "crabs");

        let unnamed_group = parse_direct_channel(raw_channel(json!({
            "id": "3", "type": 3, "name": null,
            "recipients": [{"username": "a"}, {"username": "b"}, {"username": "c"}]
        })))
        .unwrap();
        assert_eq!(unnamed_group.name, "Group with 3 members");

        assert!(parse_direct_channel(raw_channel(json!({"id": "4", "type": 1}))).is_none());
        assert!(parse_direct_channel(raw_channel(json!({"id": "5", "type": 0}))).is_none());
    }

    #[test]
    fn test_guild_channel_filters_non_text() {
        let guild = GuildRef {
            id: "g".into(),
            name: "Guild".into(),
        };
        let text = parse_guild_channel(
            raw_channel(json!({"id": "1", "type": 0, "name": "general"})),
            &guild,
        )
        .unwrap();
        assert_eq!(text.guild.as_ref().map(|g| g.id.as_str()), Some("g"));

        for code in [2, 4, 13, 15] {
            assert!(parse_guild_channel(
                raw_channel(json!({"id": "x", "type": code, "name": "other"})),
                &guild,
            )
            .is_none());
        }
    }
}

//! Channel and guild enumeration.
//!
//! Produces a [`Directory`] snapshot. Failure to list one guild removes only
//! that guild; the remaining guilds are still enumerated.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::{Channel, Directory, Guild, GuildRef, Result};

use super::parser::{
    decode_each, parse_direct_channel, parse_guild_channel, RawChannel, RawGuild,
};
use super::transport::{Endpoint, RateLimitedTransport, Transport};

/// Enumerates conversation surfaces reachable by the session.
pub struct ChannelDirectory<'a, T> {
    transport: &'a RateLimitedTransport<T>,
}

impl<'a, T: Transport> ChannelDirectory<'a, T> {
    pub const fn new(transport: &'a RateLimitedTransport<T>) -> Self {
        Self { transport }
    }

    /// Lists direct conversations and/or guild text channels.
    ///
    /// # Errors
    /// Only `Auth` escapes; every other failure shrinks the snapshot.
    pub async fn list(&self, include_direct: bool, include_guild: bool) -> Result<Directory> {
        let mut directory = Directory::default();

        if include_direct {
            directory.direct_channels = self.list_direct().await?;
        }

        if include_guild {
            directory.guilds = self.list_guilds().await?;
        }

        tracing::info!(
            direct = directory.direct_channels.len(),
            guilds = directory.guilds.len(),
            channels = directory.channel_count(),
            "Directory loaded"
        );

        Ok(directory)
    }

    async fn list_direct(&self) -> Result<Vec<Channel>> {
        let Some(payload) = self.call_or_skip(&Endpoint::DirectChannels).await? else {
            return Ok(Vec::new());
        };

        let raw: Vec<RawChannel> = match decode_each(payload) {
            Ok((raw, _)) => raw,
            Err(e) => {
                tracing::warn!("Malformed direct channel list: {e}");
                return Ok(Vec::new());
            }
        };

        Ok(raw.into_iter().filter_map(parse_direct_channel).collect())
    }

    async fn list_guilds(&self) -> Result<BTreeMap<String, Guild>> {
        let mut guilds = BTreeMap::new();

        let Some(payload) = self.call_or_skip(&Endpoint::Guilds).await? else {
            return Ok(guilds);
        };

        let raw: Vec<RawGuild> = match decode_each(payload) {
            Ok((raw, _)) => raw,
            Err(e) => {
                tracing::warn!("Malformed guild list: {e}");
                return Ok(guilds);
            }
        };

        let total = raw.len();
        for (index, raw_guild) in raw.into_iter().enumerate() {
            let guild_ref = GuildRef {
                name: raw_guild.name.unwrap_or_else(|| raw_guild.id.clone()),
                id: raw_guild.id,
            };

            tracing::info!(
                guild = %guild_ref.name,
                "Loading server channels ({}/{total})",
                index + 1
            );

            let channels = self.list_guild_channels(&guild_ref).await?;
            if channels.is_empty() {
                tracing::debug!(
                    guild_id = %guild_ref.id,
                    guild = %guild_ref.name,
                    "No readable text channels"
                );
                continue;
            }

            guilds.insert(
                guild_ref.id.clone(),
                Guild {
                    id: guild_ref.id,
                    name: guild_ref.name,
                    channels,
                },
            );
        }

        Ok(guilds)
    }

    /// Text channels of one guild, preceded by the fixed pacing delay.
    async fn list_guild_channels(&self, guild: &GuildRef) -> Result<Vec<Channel>> {
        tokio::time::sleep(self.transport.pacing().guild_delay()).await;

        let endpoint = Endpoint::GuildChannels {
            guild_id: guild.id.clone(),
        };

        let payload = match self.transport.call(&endpoint).await {
            Ok(payload) => payload,
            Err(e) if e.is_session_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(guild_id = %guild.id, guild = %guild.name, "Skipped guild: {e}");
                return Ok(Vec::new());
            }
        };

        match decode_each::<RawChannel>(payload) {
            Ok((raw, _)) => Ok(raw
                .into_iter()
                .filter_map(|c| parse_guild_channel(c, guild))
                .collect()),
            Err(e) => {
                tracing::warn!(guild_id = %guild.id, guild = %guild.name, "Skipped guild: {e}");
                Ok(Vec::new())
            }
        }
    }

    async fn call_or_skip(&self, endpoint: &Endpoint) -> Result<Option<Value>> {
        match self.transport.call(endpoint).await {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.is_session_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(resource = %endpoint, "Listing failed: {e}");
                Ok(None)
            }
        }
    }
}

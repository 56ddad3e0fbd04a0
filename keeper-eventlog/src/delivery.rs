use anyhow::Context as _;
use poise::serenity_prelude as serenity;

use keeper_storage::impls::guild_config::load_guild_config;

use crate::dispatcher::HandlerContext;
use crate::format::LogNotification;
use crate::kind::LogCategory;
use crate::outcome::{DeliveryOutcome, SkipReason};

/// Whether the bot can post log embeds in a channel, judged from the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendCheck {
    Sendable,
    GuildUnavailable,
    ChannelMissing,
    MissingPermissions,
}

impl SendCheck {
    pub fn is_sendable(self) -> bool {
        matches!(self, Self::Sendable)
    }
}

pub fn log_channel_permissions() -> serenity::Permissions {
    serenity::Permissions::VIEW_CHANNEL
        | serenity::Permissions::SEND_MESSAGES
        | serenity::Permissions::EMBED_LINKS
}

pub fn bot_can_send(
    cache: &serenity::Cache,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) -> SendCheck {
    let bot_id = cache.current_user().id;

    let Some(guild) = cache.guild(guild_id) else {
        return SendCheck::GuildUnavailable;
    };

    let Some(channel) = guild.channels.get(&channel_id) else {
        return SendCheck::ChannelMissing;
    };

    let Some(member) = guild.members.get(&bot_id) else {
        return SendCheck::MissingPermissions;
    };

    if guild
        .user_permissions_in(channel, member)
        .contains(log_channel_permissions())
    {
        SendCheck::Sendable
    } else {
        SendCheck::MissingPermissions
    }
}

/// Look up the configured channel for `category` and make sure it can receive embeds.
pub(crate) async fn resolve_destination(
    cx: &HandlerContext,
    guild_id: u64,
    category: LogCategory,
) -> Result<serenity::ChannelId, SkipReason> {
    let config = load_guild_config(&cx.storage, guild_id).await;
    let channel_id = category
        .destination(&config.log_channels)
        .ok_or(SkipReason::NoDestination(category))?;

    match bot_can_send(
        cx.cache(),
        serenity::GuildId::new(guild_id),
        serenity::ChannelId::new(channel_id),
    ) {
        SendCheck::Sendable => Ok(serenity::ChannelId::new(channel_id)),
        SendCheck::GuildUnavailable | SendCheck::ChannelMissing => {
            Err(SkipReason::DestinationMissing(channel_id))
        }
        SendCheck::MissingPermissions => Err(SkipReason::NotSendable(channel_id)),
    }
}

pub(crate) async fn send(
    cx: &HandlerContext,
    channel_id: serenity::ChannelId,
    notifications: Vec<LogNotification>,
) -> DeliveryOutcome {
    for notification in notifications {
        let result = channel_id
            .send_message(
                cx.http(),
                serenity::CreateMessage::new().embed(notification.into_embed()),
            )
            .await
            .with_context(|| format!("failed to post log embed in {channel_id}"));

        if let Err(error) = result {
            return DeliveryOutcome::Failed(error);
        }
    }

    DeliveryOutcome::Sent
}

pub(crate) async fn deliver(
    cx: &HandlerContext,
    guild_id: u64,
    category: LogCategory,
    notifications: Vec<LogNotification>,
) -> DeliveryOutcome {
    match resolve_destination(cx, guild_id, category).await {
        Ok(channel_id) => send(cx, channel_id, notifications).await,
        Err(reason) => reason.into(),
    }
}

use std::collections::BTreeSet;

use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

use crate::notices::{restart_notice_embed, send_to_ticket_logs, welcome_embed};
use keeper_core::Data;
use keeper_eventlog::{ClientHandle, bot_can_send};
use keeper_storage::impls::guild_config::{
    list_configured_guilds, load_guild_config, remove_guild_config,
};
use keeper_storage::impls::tickets::reset_active_tickets;

/// One-time startup work after the first gateway ready.
pub async fn on_startup(ctx: &serenity::Context, ready: &serenity::Ready, data: &Data) {
    data.event_log.init(ClientHandle::from_context(ctx)).await;

    if reset_active_tickets(&data.storage).await {
        info!("active tickets reset");
    } else {
        warn!("active ticket reset did not complete for every guild");
    }

    let guilds = startup_guilds(
        ready.guilds.iter().map(|guild| guild.id.get()),
        list_configured_guilds(&data.storage).await,
    );

    for guild_id in &guilds {
        load_guild_config(&data.storage, *guild_id).await;
    }
    info!(guilds = guilds.len(), "guild configurations validated");

    let mut notified = 0_usize;
    for guild_id in guilds {
        if send_to_ticket_logs(&ctx.http, data, guild_id, restart_notice_embed()).await {
            notified += 1;
        }
    }
    info!(notified, "restart notices posted");
}

/// Rebind the event log after a reconnect if startup never ran.
pub async fn on_ready(ctx: &serenity::Context, data: &Data) {
    if !data.event_log.is_initialized().await {
        data.event_log.init(ClientHandle::from_context(ctx)).await;
    }
}

pub async fn on_guild_create(
    ctx: &serenity::Context,
    data: &Data,
    guild: &serenity::Guild,
    is_new: Option<bool>,
) {
    if is_new != Some(true) {
        return;
    }

    load_guild_config(&data.storage, guild.id.get()).await;
    info!(guild_id = guild.id.get(), name = %guild.name, "joined new guild");

    let Some(channel_id) = welcome_channel(&ctx.cache, guild) else {
        warn!(guild_id = guild.id.get(), "no channel available for the welcome message");
        return;
    };

    let message = serenity::CreateMessage::new().embed(welcome_embed());
    if let Err(source) = channel_id.send_message(ctx, message).await {
        error!(?source, guild_id = guild.id.get(), "failed to send welcome message");
    }
}

pub async fn on_guild_delete(data: &Data, incomplete: &serenity::UnavailableGuild) {
    // An unavailable guild is an outage, not a removal.
    if incomplete.unavailable {
        return;
    }

    let guild_id = incomplete.id.get();
    if remove_guild_config(&data.storage, guild_id).await {
        info!(guild_id, "left guild and removed its configuration");
    }
}

/// Guilds the bot is in plus guilds with a stored configuration, deduplicated.
fn startup_guilds(ready: impl IntoIterator<Item = u64>, stored: Vec<u64>) -> BTreeSet<u64> {
    ready.into_iter().chain(stored).collect()
}

/// The system channel when the bot can post there, otherwise the first postable text channel.
fn welcome_channel(cache: &serenity::Cache, guild: &serenity::Guild) -> Option<serenity::ChannelId> {
    let sendable = |channel_id: serenity::ChannelId| {
        bot_can_send(cache, guild.id, channel_id).is_sendable()
    };

    if let Some(system) = guild.system_channel_id
        && sendable(system)
    {
        return Some(system);
    }

    let mut text_channels: Vec<&serenity::GuildChannel> = guild
        .channels
        .values()
        .filter(|channel| channel.kind == serenity::ChannelType::Text)
        .collect();
    text_channels.sort_by_key(|channel| (channel.position, channel.id));

    text_channels
        .into_iter()
        .map(|channel| channel.id)
        .find(|channel_id| sendable(*channel_id))
}

use tracing::{info, warn};

use poise::serenity_prelude as serenity;

use crate::CommandMeta;
use crate::moderation::embeds::{guild_only_message, permission_denied_message};
use keeper_core::{Context, Error};
use keeper_eventlog::{SendCheck, bot_can_send};
use keeper_storage::impls::guild_config::update_log_channels;
use keeper_storage::model::guild_config::LogChannels;
use keeper_utils::embed::{error_embed, success_embed};
use keeper_utils::formatting::channel_or_dash;
use keeper_utils::permissions::has_user_permission;

pub const META: CommandMeta = CommandMeta {
    name: "logsetup",
    desc: "Configure or reset the event log channels.",
    category: "config",
    usage: "!logsetup setup <rolelog> <channellog> <messagelog> <voicelog> <modlog> | !logsetup reset",
};

#[poise::command(
    prefix_command,
    slash_command,
    category = "Configuration",
    subcommands("setup", "reset"),
    subcommand_required
)]
pub async fn logsetup(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Configure log channels for different events.
#[poise::command(prefix_command, slash_command, category = "Configuration")]
pub async fn setup(
    ctx: Context<'_>,
    #[description = "Channel for role change logs"]
    #[channel_types("Text")]
    rolelog: serenity::GuildChannel,
    #[description = "Channel for channel change logs"]
    #[channel_types("Text")]
    channellog: serenity::GuildChannel,
    #[description = "Channel for message logs"]
    #[channel_types("Text")]
    messagelog: serenity::GuildChannel,
    #[description = "Channel for voice activity logs"]
    #[channel_types("Text")]
    voicelog: serenity::GuildChannel,
    #[description = "Channel for moderation logs"]
    #[channel_types("Text")]
    modlog: serenity::GuildChannel,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    if !can_manage_guild(ctx, guild_id).await? {
        ctx.say(permission_denied_message()).await?;
        return Ok(());
    }

    ctx.defer_ephemeral().await?;

    let targets = [&rolelog, &channellog, &messagelog, &voicelog, &modlog];
    for channel in targets {
        let check = bot_can_send(ctx.cache(), guild_id, channel.id);
        if let Some(problem) = send_check_problem(check, channel.id) {
            ctx.send(
                poise::CreateReply::default()
                    .content(problem)
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    }

    let channels = LogChannels {
        role_log: Some(rolelog.id.get()),
        channel_log: Some(channellog.id.get()),
        message_log: Some(messagelog.id.get()),
        voice_log: Some(voicelog.id.get()),
        moderation_log: Some(modlog.id.get()),
    };

    let data = ctx.data();
    if !update_log_channels(&data.storage, guild_id.get(), &channels).await {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ There was an error with the logging system configuration.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }
    data.event_log.clear_cache(Some(guild_id.get())).await;
    info!(guild_id = guild_id.get(), ?channels, "log channels configured");

    let test_embed = success_embed(
        "✅ Log Channel Active",
        "This channel has been configured for logging.",
    )
    .timestamp(serenity::Timestamp::now());

    let mut failed_sends = 0_usize;
    for channel in targets {
        let message = serenity::CreateMessage::new().embed(test_embed.clone());
        if let Err(source) = channel.id.send_message(ctx.http(), message).await {
            failed_sends += 1;
            warn!(?source, channel_id = channel.id.get(), "failed to send log channel test message");
        }
    }
    if failed_sends > 0 {
        warn!(
            guild_id = guild_id.get(),
            failed_sends, "some log channels did not receive the test message"
        );
    }

    ctx.send(
        poise::CreateReply::default()
            .embed(log_setup_summary_embed(&channels))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// Reset all log channel configurations.
#[poise::command(prefix_command, slash_command, category = "Configuration")]
pub async fn reset(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    if !can_manage_guild(ctx, guild_id).await? {
        ctx.say(permission_denied_message()).await?;
        return Ok(());
    }

    let data = ctx.data();
    if !update_log_channels(&data.storage, guild_id.get(), &LogChannels::default()).await {
        ctx.say("❌ There was an error with the logging system configuration.")
            .await?;
        return Ok(());
    }
    data.event_log.clear_cache(Some(guild_id.get())).await;
    info!(guild_id = guild_id.get(), "log channels reset");

    let embed = error_embed(
        "🔄 Logging System Reset",
        "All log channel configurations have been reset.",
    )
    .timestamp(serenity::Timestamp::now());
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}

async fn can_manage_guild(ctx: Context<'_>, guild_id: serenity::GuildId) -> Result<bool, Error> {
    has_user_permission(
        ctx.http(),
        guild_id,
        ctx.author().id,
        serenity::Permissions::MANAGE_GUILD,
    )
    .await
}

fn send_check_problem(check: SendCheck, channel_id: serenity::ChannelId) -> Option<String> {
    let channel = channel_id.get();
    match check {
        SendCheck::Sendable => None,
        SendCheck::GuildUnavailable => {
            Some("❌ This server isn't available to me yet. Try again in a moment.".to_owned())
        }
        SendCheck::ChannelMissing => Some(format!("❌ I can't see <#{channel}> in this server.")),
        SendCheck::MissingPermissions => Some(format!(
            "❌ I need View Channel, Send Messages, and Embed Links permissions in <#{channel}>"
        )),
    }
}

fn log_setup_summary_embed(channels: &LogChannels) -> serenity::CreateEmbed {
    success_embed(
        "📝 Logging System Setup",
        "Log channels have been configured successfully!",
    )
    .field("📋 Role Logs", channel_or_dash(channels.role_log), true)
    .field("🔧 Channel Logs", channel_or_dash(channels.channel_log), true)
    .field("💬 Message Logs", channel_or_dash(channels.message_log), true)
    .field("🔊 Voice Logs", channel_or_dash(channels.voice_log), true)
    .field("🛠️ Moderation Logs", channel_or_dash(channels.moderation_log), true)
    .timestamp(serenity::Timestamp::now())
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude as serenity;

    use super::{log_setup_summary_embed, send_check_problem};
    use keeper_eventlog::SendCheck;
    use keeper_storage::model::guild_config::LogChannels;

    #[test]
    fn only_sendable_channels_pass() {
        let channel = serenity::ChannelId::new(55);

        assert_eq!(send_check_problem(SendCheck::Sendable, channel), None);
        assert!(
            send_check_problem(SendCheck::MissingPermissions, channel)
                .unwrap()
                .contains("<#55>")
        );
        assert!(send_check_problem(SendCheck::ChannelMissing, channel).is_some());
    }

    #[test]
    fn summary_lists_every_channel() {
        let channels = LogChannels {
            role_log: Some(1),
            channel_log: Some(2),
            message_log: Some(3),
            voice_log: Some(4),
            moderation_log: None,
        };
        let value = serde_json::to_value(log_setup_summary_embed(&channels)).unwrap();
        let fields = value["fields"].as_array().unwrap();

        assert_eq!(fields.len(), 5);
        assert_eq!(fields[2]["value"], "<#3>");
        assert_eq!(fields[4]["value"], "-");
    }
}

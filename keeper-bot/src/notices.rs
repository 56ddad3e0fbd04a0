//! Embeds the bot posts on its own behalf (restart, welcome, error reports).

use poise::serenity_prelude as serenity;
use tracing::warn;

use keeper_core::Data;
use keeper_storage::impls::guild_config::load_guild_config;
use keeper_utils::embed::configured_color;
use keeper_utils::formatting::truncate_chars;

const NOTICE_COLOR: &str = "#2f3136";
const ERROR_REPORT_COLOR: u32 = 0xFF_00_00;
const ERROR_DETAIL_MAX_CHARS: usize = 1_000;

pub fn restart_notice_embed() -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .color(configured_color(NOTICE_COLOR))
        .title("🔄 Bot Restarted")
        .description("The bot has restarted and ticket data has been reset.")
        .field("Status", "✅ Ready to create new tickets", false)
        .timestamp(serenity::Timestamp::now())
}

pub fn welcome_embed() -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .color(configured_color(NOTICE_COLOR))
        .title("👋 Thanks for adding me!")
        .description("To get started, run `/logsetup setup` and `/ticketsetup` to configure the bot.")
        .field(
            "📝 Required Setup",
            "An administrator needs to configure:\n- Staff Roles\n- Log Channels\n- Ticket Category",
            false,
        )
        .field("🤔 Need Help?", "Use `/help` to see all available commands", false)
        .timestamp(serenity::Timestamp::now())
}

/// Error report sent to a guild's ticket log channel.
pub fn error_report_embed(context: &str, error: &str) -> serenity::CreateEmbed {
    let detail = truncate_chars(&error.replace("```", "'''"), ERROR_DETAIL_MAX_CHARS);

    serenity::CreateEmbed::new()
        .color(ERROR_REPORT_COLOR)
        .title("⚠️ Bot Error Detected")
        .description(format!("**Context:** {context}\n\n**Error:** ```{detail}```"))
        .timestamp(serenity::Timestamp::now())
}

/// Post `embed` to the guild's ticket log channel, if one is configured.
pub async fn send_to_ticket_logs(
    http: &serenity::Http,
    data: &Data,
    guild_id: u64,
    embed: serenity::CreateEmbed,
) -> bool {
    let config = load_guild_config(&data.storage, guild_id).await;
    let Some(channel_id) = config.ticket_system.channels.logs else {
        return false;
    };

    let message = serenity::CreateMessage::new().embed(embed);
    match serenity::ChannelId::new(channel_id)
        .send_message(http, message)
        .await
    {
        Ok(_) => true,
        Err(source) => {
            warn!(?source, guild_id, channel_id, "failed to post to ticket log channel");
            false
        }
    }
}

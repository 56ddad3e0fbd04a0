use poise::serenity_prelude as serenity;

use crate::CommandMeta;
use crate::moderation::embeds::guild_only_message;
use keeper_core::{Context, Error};
use keeper_storage::impls::guild_config::load_guild_config;
use keeper_storage::impls::tickets::get_guild_stats;
use keeper_storage::model::guild_config::GuildConfig;
use keeper_storage::model::tickets::TicketMetadata;
use keeper_utils::embed::configured_color;
use keeper_utils::formatting::channel_or_dash;

pub const META: CommandMeta = CommandMeta {
    name: "ticketstats",
    desc: "Show ticket counters and server statistics.",
    category: "config",
    usage: "!ticketstats",
};

#[poise::command(prefix_command, slash_command, category = "Configuration")]
pub async fn ticketstats(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let storage = &ctx.data().storage;
    let metadata = get_guild_stats(storage, guild_id.get()).await;
    let config = load_guild_config(storage, guild_id.get()).await;

    ctx.send(poise::CreateReply::default().embed(ticket_stats_embed(&metadata, &config)))
        .await?;

    Ok(())
}

fn ticket_stats_embed(metadata: &TicketMetadata, config: &GuildConfig) -> serenity::CreateEmbed {
    let status = if config.ticket_system.enabled {
        "Enabled"
    } else {
        "Not configured"
    };

    serenity::CreateEmbed::new()
        .title("🎫 Ticket Statistics")
        .color(configured_color(&config.ticket_system.settings.embed_colors.main))
        .field("Total Tickets", metadata.total_tickets.to_string(), true)
        .field("Active Tickets", metadata.active_tickets.to_string(), true)
        .field("Last Ticket", format!("#{}", metadata.last_ticket_id), true)
        .field("Ticket System", status, true)
        .field(
            "Ticket Logs",
            channel_or_dash(config.ticket_system.channels.logs),
            true,
        )
        .field(
            "Commands Used",
            config.statistics.commands_used.to_string(),
            true,
        )
        .timestamp(serenity::Timestamp::now())
}

#[cfg(test)]
mod tests {
    use keeper_storage::model::guild_config::GuildConfig;
    use keeper_storage::model::tickets::TicketMetadata;

    use super::ticket_stats_embed;

    #[test]
    fn unconfigured_guild_reports_zeroes() {
        let metadata = TicketMetadata::default();
        let config = GuildConfig::default();
        let value = serde_json::to_value(ticket_stats_embed(&metadata, &config)).unwrap();

        assert_eq!(value["fields"][0]["value"], "0");
        assert_eq!(value["fields"][3]["value"], "Not configured");
        assert_eq!(value["fields"][4]["value"], "-");
        assert_eq!(value["color"], 0x2f_31_36);
    }
}

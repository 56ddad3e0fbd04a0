use serde_json::{Value, json};
use tracing::info;

use poise::serenity_prelude as serenity;

use crate::CommandMeta;
use crate::moderation::embeds::{guild_only_message, permission_denied_message};
use keeper_core::{Context, Error};
use keeper_storage::impls::guild_config::update_guild_config;
use keeper_utils::permissions::has_user_permission;

pub const META: CommandMeta = CommandMeta {
    name: "ticketsetup",
    desc: "Configure the ticket system channels and staff role.",
    category: "config",
    usage: "!ticketsetup <panel> <logs> <transcript> <category> <staffrole>",
};

const PANEL_WELCOME: &str = "To contact technical support, please select an option below.";

#[poise::command(prefix_command, slash_command, category = "Configuration")]
pub async fn ticketsetup(
    ctx: Context<'_>,
    #[description = "Channel for the ticket panel"]
    #[channel_types("Text")]
    panel: serenity::GuildChannel,
    #[description = "Channel for ticket logs"]
    #[channel_types("Text")]
    logs: serenity::GuildChannel,
    #[description = "Channel for ticket transcripts"]
    #[channel_types("Text")]
    transcript: serenity::GuildChannel,
    #[description = "Category new tickets are created in"]
    #[channel_types("Category")]
    category: serenity::GuildChannel,
    #[description = "Staff role"] staffrole: serenity::Role,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    if !has_user_permission(
        ctx.http(),
        guild_id,
        ctx.author().id,
        serenity::Permissions::MANAGE_GUILD,
    )
    .await?
    {
        ctx.say(permission_denied_message()).await?;
        return Ok(());
    }

    let patch = ticket_system_patch(TicketSetup {
        panel: panel.id.get(),
        logs: logs.id.get(),
        transcript: transcript.id.get(),
        category: category.id.get(),
        staff_role: staffrole.id.get(),
    });

    if !update_guild_config(&ctx.data().storage, guild_id.get(), &patch).await {
        ctx.say("❌ There was an error setting up the ticket system").await?;
        return Ok(());
    }
    info!(guild_id = guild_id.get(), "ticket system configured");

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "✅ Ticket system has been setup in <#{}>\nLogs: <#{}>\nTranscripts: <#{}>\nCategory: <#{}>\nStaff Role: <@&{}>",
                panel.id, logs.id, transcript.id, category.id, staffrole.id
            ))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

struct TicketSetup {
    panel: u64,
    logs: u64,
    transcript: u64,
    category: u64,
    staff_role: u64,
}

/// Configuration patch for the ticket system; ids are stored as strings.
fn ticket_system_patch(setup: TicketSetup) -> Value {
    json!({
        "ticketSystem": {
            "enabled": true,
            "channels": {
                "category": setup.category.to_string(),
                "logs": setup.logs.to_string(),
                "transcript": setup.transcript.to_string(),
                "ticketPanel": setup.panel.to_string(),
            },
            "roles": {
                "staff": [setup.staff_role.to_string()],
            },
            "messages": {
                "welcome": PANEL_WELCOME,
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use keeper_storage::model::guild_config::GuildConfig;
    use keeper_storage::merge::deep_merge;

    use super::{TicketSetup, ticket_system_patch};

    #[test]
    fn patch_applies_to_default_config() {
        let patch = ticket_system_patch(TicketSetup {
            panel: 1,
            logs: 2,
            transcript: 3,
            category: 4,
            staff_role: 5,
        });

        let mut document = serde_json::to_value(GuildConfig::default()).unwrap();
        deep_merge(&mut document, &patch);
        let config: GuildConfig = serde_json::from_value(document).unwrap();

        assert!(config.ticket_system.enabled);
        assert_eq!(config.ticket_system.channels.ticket_panel, Some(1));
        assert_eq!(config.ticket_system.channels.logs, Some(2));
        assert_eq!(config.ticket_system.channels.category, Some(4));
        assert_eq!(config.ticket_system.roles.staff, vec![5]);
        assert_eq!(config.ticket_system.settings.max_tickets_per_user, 1);
    }
}

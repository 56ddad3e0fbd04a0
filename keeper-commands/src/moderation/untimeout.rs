use tracing::error;

use poise::serenity_prelude as serenity;

use crate::CommandMeta;
use crate::moderation::embeds::{
    action_failed_message, guild_only_message, moderation_action_embed, permission_denied_message,
    target_profile_from_user, usage_message,
};
use keeper_core::{Context, Error};
use keeper_eventlog::{ModerationAction, ModerationEntry};
use keeper_utils::permissions::has_user_permission;

pub const META: CommandMeta = CommandMeta {
    name: "untimeout",
    desc: "Remove a timeout from a user.",
    category: "moderation",
    usage: "!untimeout <user> [reason]",
};

#[poise::command(prefix_command, slash_command, category = "Moderation")]
pub async fn untimeout(
    ctx: Context<'_>,
    #[description = "The user to remove timeout from"] user: Option<serenity::User>,
    #[description = "Reason for removing the timeout"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    if !has_user_permission(
        ctx.http(),
        guild_id,
        ctx.author().id,
        serenity::Permissions::MODERATE_MEMBERS,
    )
    .await?
    {
        ctx.say(permission_denied_message()).await?;
        return Ok(());
    }

    let Some(user) = user else {
        ctx.say(usage_message(META.usage)).await?;
        return Ok(());
    };

    let edit = serenity::EditMember::new()
        .enable_communication()
        .audit_log_reason(reason.as_deref().unwrap_or("No reason provided"));

    if let Err(source) = guild_id.edit_member(ctx.http(), user.id, edit).await {
        error!(?source, guild_id = guild_id.get(), "untimeout request failed");
        ctx.say(action_failed_message("remove the timeout from", &source))
            .await?;
        return Ok(());
    }

    ctx.data()
        .event_log
        .log_moderation(
            guild_id.get(),
            ModerationEntry::new(
                ModerationAction::Untimeout,
                user.id.get(),
                ctx.author().id.get(),
            )
            .reason(reason.as_deref()),
        )
        .await;

    let target_profile = target_profile_from_user(&user);
    let embed = moderation_action_embed(
        &target_profile,
        user.id,
        "released from timeout",
        reason.as_deref(),
        None,
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

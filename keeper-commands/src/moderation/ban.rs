use tracing::error;

use poise::serenity_prelude as serenity;

use crate::CommandMeta;
use crate::moderation::embeds::{
    action_failed_message, guild_only_message, moderation_action_embed,
    moderation_self_action_message, permission_denied_message, target_profile_from_user,
    usage_message,
};
use keeper_core::{Context, Error};
use keeper_eventlog::{ModerationAction, ModerationEntry};
use keeper_utils::permissions::has_user_permission;

pub const META: CommandMeta = CommandMeta {
    name: "ban",
    desc: "Ban a user from the server.",
    category: "moderation",
    usage: "!ban <user> [reason]",
};

/// Days of message history removed alongside the ban.
const DELETE_MESSAGE_DAYS: u8 = 1;

#[poise::command(prefix_command, slash_command, category = "Moderation")]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "The user to ban"] user: Option<serenity::User>,
    #[description = "Reason for the ban"]
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
        serenity::Permissions::BAN_MEMBERS,
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

    if user.id == ctx.author().id {
        ctx.say(moderation_self_action_message("ban")).await?;
        return Ok(());
    }

    let audit_reason = reason.as_deref().unwrap_or("No reason provided");
    if let Err(source) = guild_id
        .ban_with_reason(ctx.http(), user.id, DELETE_MESSAGE_DAYS, audit_reason)
        .await
    {
        error!(?source, guild_id = guild_id.get(), "ban request failed");
        ctx.say(action_failed_message("ban", &source)).await?;
        return Ok(());
    }

    ctx.data()
        .event_log
        .log_moderation(
            guild_id.get(),
            ModerationEntry::new(ModerationAction::Ban, user.id.get(), ctx.author().id.get())
                .reason(reason.as_deref()),
        )
        .await;

    let target_profile = target_profile_from_user(&user);
    let embed = moderation_action_embed(&target_profile, user.id, "banned", reason.as_deref(), None);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

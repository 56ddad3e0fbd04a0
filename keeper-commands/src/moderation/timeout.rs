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
use keeper_utils::formatting::format_compact_duration;
use keeper_utils::parse::parse_duration_seconds;
use keeper_utils::permissions::has_user_permission;
use keeper_utils::time::{MAX_TIMEOUT_SECS, timestamp_after};

pub const META: CommandMeta = CommandMeta {
    name: "timeout",
    desc: "Timeout a user for a duration (default: 10m, max: 28d).",
    category: "moderation",
    usage: "!timeout <user> [duration] [reason]",
};

const DEFAULT_TIMEOUT_SECS: u64 = 10 * 60;

#[poise::command(prefix_command, slash_command, category = "Moderation")]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "The user to timeout"] user: Option<serenity::User>,
    #[description = "Duration (e.g. 10m, 2h)"] duration: Option<String>,
    #[description = "Reason for timeout"]
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

    if user.id == ctx.author().id {
        ctx.say(moderation_self_action_message("timeout")).await?;
        return Ok(());
    }

    let Some(seconds) = timeout_seconds(duration.as_deref()) else {
        ctx.say(format!(
            "Invalid duration. Usage: `{}` (examples: 30s, 10m, 2h, 1d; at most 28d)",
            META.usage
        ))
        .await?;
        return Ok(());
    };
    let duration_label = format_compact_duration(seconds);

    let until = timestamp_after(seconds)?;
    let edit = serenity::EditMember::new()
        .disable_communication_until_datetime(until)
        .audit_log_reason(reason.as_deref().unwrap_or("No reason provided"));

    if let Err(source) = guild_id.edit_member(ctx.http(), user.id, edit).await {
        error!(?source, guild_id = guild_id.get(), "timeout request failed");
        ctx.say(action_failed_message("timeout", &source)).await?;
        return Ok(());
    }

    ctx.data()
        .event_log
        .log_moderation(
            guild_id.get(),
            ModerationEntry::new(ModerationAction::Timeout, user.id.get(), ctx.author().id.get())
                .reason(reason.as_deref())
                .duration(duration_label.as_str()),
        )
        .await;

    let target_profile = target_profile_from_user(&user);
    let embed = moderation_action_embed(
        &target_profile,
        user.id,
        "timed out",
        reason.as_deref(),
        Some(&duration_label),
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Resolve the requested timeout length; `None` when unparsable or too long.
fn timeout_seconds(raw: Option<&str>) -> Option<u64> {
    match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            parse_duration_seconds(raw).filter(|seconds| *seconds <= MAX_TIMEOUT_SECS)
        }
        _ => Some(DEFAULT_TIMEOUT_SECS),
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_TIMEOUT_SECS, timeout_seconds};

    #[test]
    fn missing_duration_uses_default() {
        assert_eq!(timeout_seconds(None), Some(DEFAULT_TIMEOUT_SECS));
        assert_eq!(timeout_seconds(Some("  ")), Some(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn durations_are_capped_at_the_platform_limit() {
        assert_eq!(timeout_seconds(Some("2h")), Some(7_200));
        assert_eq!(timeout_seconds(Some("28d")), Some(28 * 86_400));
        assert_eq!(timeout_seconds(Some("29d")), None);
        assert_eq!(timeout_seconds(Some("soon")), None);
    }
}

use poise::serenity_prelude as serenity;

use keeper_utils::embed::DEFAULT_EMBED_COLOR;

#[derive(Clone, Debug)]
pub struct TargetProfile {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

pub fn target_profile_from_user(user: &serenity::User) -> TargetProfile {
    TargetProfile {
        display_name: user
            .global_name
            .clone()
            .unwrap_or_else(|| user.name.clone()),
        avatar_url: Some(user.face()),
    }
}

/// Reply embed shown in the invoking channel after a moderation action.
pub fn moderation_action_embed(
    target_profile: &TargetProfile,
    target_user_id: serenity::UserId,
    action_past_tense: &str,
    reason: Option<&str>,
    duration: Option<&str>,
) -> serenity::CreateEmbed {
    let reason = reason
        .unwrap_or("No reason provided")
        .replace('@', "@\u{200B}");

    let mut description = format!(
        "**Target :** <@{}>\n**Reason :** {}",
        target_user_id.get(),
        reason
    );
    if let Some(duration) = duration {
        description.push_str(&format!("\n**Duration :** {duration}"));
    }

    let headline = format!("{} has been {}", target_profile.display_name, action_past_tense);
    let embed = serenity::CreateEmbed::new()
        .color(DEFAULT_EMBED_COLOR)
        .description(description);

    match target_profile.avatar_url.as_deref() {
        Some(url) => embed.author(serenity::CreateEmbedAuthor::new(headline).icon_url(url)),
        None => embed.title(headline),
    }
}

pub fn usage_message(usage: &str) -> String {
    format!("Usage: `{usage}`")
}

pub fn guild_only_message() -> &'static str {
    "This command only works in servers."
}

pub fn permission_denied_message() -> &'static str {
    "You don't have permission to use this command."
}

pub fn moderation_self_action_message(action: &str) -> String {
    format!("You can't {action} yourself.")
}

/// Reply for a failed platform action, distinguishing missing bot permissions.
pub fn action_failed_message(action: &str, source: &serenity::Error) -> String {
    if keeper_utils::permissions::is_missing_permissions(source) {
        format!("I couldn't {action} that user. Check role hierarchy and my permissions.")
    } else {
        format!("I couldn't {action} that user. Please try again later.")
    }
}

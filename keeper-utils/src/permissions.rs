use poise::serenity_prelude as serenity;

/// Convert a permission bitset into a sorted display list.
pub fn permission_names(perms: serenity::Permissions) -> Vec<String> {
    let mut names: Vec<String> = perms
        .iter_names()
        .map(|(name, _flag)| name.to_owned())
        .collect();
    names.sort_unstable();
    names
}

/// Resolve a member's effective guild-level permissions.
pub async fn resolve_user_permissions(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> anyhow::Result<serenity::Permissions> {
    let guild = guild_id.to_partial_guild(http).await?;
    if guild.owner_id == user_id {
        return Ok(serenity::Permissions::all());
    }

    let member = guild_id.member(http, user_id).await?;
    let everyone_role_id = serenity::RoleId::new(guild_id.get());

    let resolved = guild
        .roles
        .values()
        .filter(|role| role.id == everyone_role_id || member.roles.contains(&role.id))
        .fold(serenity::Permissions::empty(), |acc, role| acc | role.permissions);

    Ok(resolved)
}

pub async fn has_user_permission(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    required: serenity::Permissions,
) -> anyhow::Result<bool> {
    let perms = resolve_user_permissions(http, guild_id, user_id).await?;

    Ok(perms.contains(serenity::Permissions::ADMINISTRATOR) || perms.contains(required))
}

/// Whether a platform error means the bot lacks permissions (HTTP 403 / code 50013).
pub fn is_missing_permissions(source: &serenity::Error) -> bool {
    matches!(
        source,
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 403 || response.error.code == 50013
    )
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude as serenity;

    use super::permission_names;

    #[test]
    fn names_are_sorted() {
        let names = permission_names(
            serenity::Permissions::SEND_MESSAGES | serenity::Permissions::EMBED_LINKS,
        );
        assert_eq!(names, ["EMBED_LINKS", "SEND_MESSAGES"]);
    }
}

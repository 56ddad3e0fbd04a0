use ::serenity::model::guild::audit_log::Action;
use poise::serenity_prelude as serenity;
use tracing::debug;

/// Best-effort lookup of who performed the most recent `action` in a guild.
///
/// The newest audit-log entry only counts when it targets `target_id`; any
/// failure (missing View Audit Log permission included) yields `None`.
pub(crate) async fn recent_actor(
    http: &serenity::Http,
    guild_id: u64,
    action: Action,
    target_id: u64,
) -> Option<u64> {
    let logs = match serenity::GuildId::new(guild_id)
        .audit_logs(http, Some(action), None, None, Some(1))
        .await
    {
        Ok(logs) => logs,
        Err(source) => {
            debug!(?source, guild_id, "audit log lookup failed");
            return None;
        }
    };

    let entry = logs.entries.first()?;
    if entry.target_id.map(|id| id.get()) != Some(target_id) {
        return None;
    }

    Some(entry.user_id.get())
}

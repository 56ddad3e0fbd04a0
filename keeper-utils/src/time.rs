use poise::serenity_prelude as serenity;

/// Longest communication timeout the platform accepts (28 days).
pub const MAX_TIMEOUT_SECS: u64 = 28 * 86_400;

/// Timestamp `seconds` from now.
pub fn timestamp_after(seconds: u64) -> anyhow::Result<serenity::Timestamp> {
    let now = serenity::Timestamp::now().unix_timestamp();
    let offset = i64::try_from(seconds)?;
    let until = now
        .checked_add(offset)
        .ok_or_else(|| anyhow::anyhow!("timestamp overflow"))?;

    Ok(serenity::Timestamp::from_unix_timestamp(until)?)
}

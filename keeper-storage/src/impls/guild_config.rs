use anyhow::Context as _;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::cache::{guild_config_key, invalidate_all_guild_configs, invalidate_guild_config};
use crate::merge::{deep_merge, merge_defaults, reset_invalid_leaves};
use crate::model::guild_config::{GuildConfig, LogChannels, Statistic};
use crate::storage::{Storage, list_guild_ids, read_json, remove_if_exists, write_json_pretty};

/// Load a guild's configuration, creating and persisting the default on first access.
///
/// Never fails: a read or parse error is logged and an in-memory default is
/// returned (neither cached nor persisted, so the stored file is left alone).
pub async fn load_guild_config(storage: &Storage, guild_id: u64) -> GuildConfig {
    let cache_key = guild_config_key(storage.cache(), guild_id);
    let loaded = storage
        .cache()
        .get_or_load_json(&cache_key, || read_or_create(storage, guild_id))
        .await;

    match loaded {
        Ok(config) => config,
        Err(source) => {
            error!(?source, guild_id, "failed to load guild config; using defaults");
            GuildConfig::default()
        }
    }
}

async fn read_or_create(storage: &Storage, guild_id: u64) -> anyhow::Result<GuildConfig> {
    let path = storage.config_path(guild_id);

    let Some(stored) = read_json(&path).await? else {
        let config = GuildConfig::default();
        write_json_pretty(&path, &config).await?;
        debug!(guild_id, "created default guild config");
        return Ok(config);
    };

    let defaults = default_document();
    let mut merged = merge_defaults(&stored, &defaults);
    let reset = reset_invalid_leaves::<GuildConfig>(&mut merged, &defaults);
    if !reset.is_empty() {
        warn!(guild_id, ?reset, "reset invalid values in stored guild config");
    }

    let config: GuildConfig = serde_json::from_value(merged.clone())
        .with_context(|| format!("guild config for {guild_id} does not match the schema"))?;

    if merged != stored {
        write_json_pretty(&path, &merged).await?;
        info!(guild_id, "repaired stored guild config");
    }

    Ok(config)
}

/// Stamp `lastUpdated`, persist the full document and drop the cached copy.
pub async fn save_guild_config(storage: &Storage, guild_id: u64, config: &GuildConfig) -> bool {
    match persist(storage, guild_id, config).await {
        Ok(()) => true,
        Err(source) => {
            error!(?source, guild_id, "failed to save guild config");
            false
        }
    }
}

async fn persist(storage: &Storage, guild_id: u64, config: &GuildConfig) -> anyhow::Result<()> {
    let mut stamped = config.clone();
    stamped.last_updated = Utc::now();

    write_json_pretty(&storage.config_path(guild_id), &stamped).await?;

    // Evict instead of caching `stamped`: with interleaved saves the file holds
    // the last write, and only a re-read is guaranteed to match it.
    invalidate_guild_config(storage.cache(), guild_id).await?;

    Ok(())
}

/// Deep-merge `patch` (camelCase keys, same shape as the stored document) into
/// the current configuration and save it.
///
/// Any `ticketSystem` patch forces `ticketSystem.enabled = true`, and every
/// update marks the guild as set up.
pub async fn update_guild_config(storage: &Storage, guild_id: u64, patch: &Value) -> bool {
    let current = load_guild_config(storage, guild_id).await;

    let config = match apply_patch(&current, patch) {
        Ok(config) => config,
        Err(source) => {
            error!(?source, guild_id, "rejected guild config patch");
            return false;
        }
    };

    save_guild_config(storage, guild_id, &config).await
}

fn apply_patch(current: &GuildConfig, patch: &Value) -> anyhow::Result<GuildConfig> {
    let mut document = serde_json::to_value(current).context("failed to serialize guild config")?;
    deep_merge(&mut document, patch);

    let defaults = default_document();
    let mut merged = merge_defaults(&document, &defaults);
    let reset = reset_invalid_leaves::<GuildConfig>(&mut merged, &defaults);
    if !reset.is_empty() {
        warn!(?reset, "ignored invalid values in guild config patch");
    }

    if patch.get("ticketSystem").is_some()
        && let Some(ticket_system) = merged.get_mut("ticketSystem").and_then(Value::as_object_mut)
    {
        ticket_system.insert("enabled".to_owned(), Value::Bool(true));
    }

    if let Some(root) = merged.as_object_mut() {
        root.insert("setupComplete".to_owned(), Value::Bool(true));
    }

    serde_json::from_value(merged).context("patched guild config does not match the schema")
}

/// Replace every log channel at once (a `None` clears that destination).
pub async fn update_log_channels(storage: &Storage, guild_id: u64, channels: &LogChannels) -> bool {
    let channels = match serde_json::to_value(channels) {
        Ok(channels) => channels,
        Err(source) => {
            error!(?source, guild_id, "failed to serialize log channels");
            return false;
        }
    };

    let mut patch = Map::new();
    patch.insert("logChannels".to_owned(), channels);
    update_guild_config(storage, guild_id, &Value::Object(patch)).await
}

/// Delete a guild's persisted configuration and evict it from the cache.
pub async fn remove_guild_config(storage: &Storage, guild_id: u64) -> bool {
    let removed = remove_if_exists(&storage.config_path(guild_id)).await;
    let evicted = invalidate_guild_config(storage.cache(), guild_id).await;

    match (removed, evicted) {
        (Ok(_), Ok(())) => true,
        (Err(source), _) | (_, Err(source)) => {
            error!(?source, guild_id, "failed to remove guild config");
            false
        }
    }
}

/// Evict one guild (or every guild) so the next load re-reads storage.
pub async fn clear_guild_config_cache(storage: &Storage, guild_id: Option<u64>) {
    let result = match guild_id {
        Some(guild_id) => invalidate_guild_config(storage.cache(), guild_id).await.map(|()| 1),
        None => invalidate_all_guild_configs(storage.cache()).await,
    };

    match result {
        Ok(evicted) => debug!(?guild_id, evicted, "cleared guild config cache"),
        Err(source) => warn!(?source, ?guild_id, "failed to clear guild config cache"),
    }
}

/// Bump one statistics counter and return its new value, or `None` if the save failed.
pub async fn increment_statistic(storage: &Storage, guild_id: u64, stat: Statistic) -> Option<u64> {
    let mut config = load_guild_config(storage, guild_id).await;
    let counter = config.statistics.counter_mut(stat);
    *counter = counter.saturating_add(1);
    let value = *counter;

    save_guild_config(storage, guild_id, &config)
        .await
        .then_some(value)
}

pub async fn is_setup_complete(storage: &Storage, guild_id: u64) -> bool {
    load_guild_config(storage, guild_id).await.setup_complete
}

/// Guild ids with a persisted configuration document.
pub async fn list_configured_guilds(storage: &Storage) -> Vec<u64> {
    match list_guild_ids(storage.configs_dir()).await {
        Ok(guild_ids) => guild_ids,
        Err(source) => {
            error!(?source, "failed to list guild configs");
            Vec::new()
        }
    }
}

fn default_document() -> Value {
    serde_json::to_value(GuildConfig::default()).unwrap_or_else(|_| Value::Object(Map::new()))
}

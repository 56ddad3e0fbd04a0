use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheService;

const CONFIGS_DIR: &str = "configs";
const TICKETS_DIR: &str = "tickets";

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Shared storage handle passed across crates.
///
/// Built once at startup and cloned into every component that needs the
/// configuration or ticket stores.
#[derive(Clone, Debug)]
pub struct Storage {
    configs_dir: PathBuf,
    tickets_dir: PathBuf,
    cache: CacheService,
}

impl Storage {
    /// Open (and create if needed) the store directories under `root`.
    pub async fn open(root: impl AsRef<Path>, cache: CacheService) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let storage = Self {
            configs_dir: root.join(CONFIGS_DIR),
            tickets_dir: root.join(TICKETS_DIR),
            cache,
        };

        for dir in [&storage.configs_dir, &storage.tickets_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create `{}`", dir.display()))?;
        }

        Ok(storage)
    }

    pub fn configs_dir(&self) -> &Path {
        &self.configs_dir
    }

    pub fn tickets_dir(&self) -> &Path {
        &self.tickets_dir
    }

    /// Expose the cache service for store modules.
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    pub(crate) fn config_path(&self, guild_id: u64) -> PathBuf {
        self.configs_dir.join(format!("{guild_id}.json"))
    }

    pub(crate) fn tickets_path(&self, guild_id: u64) -> PathBuf {
        self.tickets_dir.join(format!("{guild_id}.json"))
    }
}

/// Read a JSON document. A missing file is `Ok(None)`.
pub(crate) async fn read_json(path: &Path) -> anyhow::Result<Option<Value>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(source).with_context(|| format!("failed to read `{}`", path.display()));
        }
    };

    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("`{}` is not valid JSON", path.display()))?;

    Ok(Some(value))
}

/// Write a pretty-printed JSON document through a temporary file and a rename,
/// so a concurrent reader never observes a partial write.
pub(crate) async fn write_json_pretty<T>(path: &Path, value: &T) -> anyhow::Result<()>
where
    T: Serialize,
{
    let payload = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize `{}`", path.display()))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("document path has no file name")?;
    let temp_path = path.with_file_name(format!(
        ".{file_name}.{}.tmp",
        TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    tokio::fs::write(&temp_path, payload)
        .await
        .with_context(|| format!("failed to write `{}`", temp_path.display()))?;

    if let Err(source) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(source).with_context(|| format!("failed to replace `{}`", path.display()));
    }

    Ok(())
}

/// Remove a document. Returns whether a file was actually deleted.
pub(crate) async fn remove_if_exists(path: &Path) -> anyhow::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(source) if source.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(source).with_context(|| format!("failed to remove `{}`", path.display())),
    }
}

/// Guild ids of every `<guild_id>.json` document in `dir`, in ascending order.
pub(crate) async fn list_guild_ids(dir: &Path) -> anyhow::Result<Vec<u64>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to list `{}`", dir.display()))?;

    let mut guild_ids = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        if let Some(guild_id) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<u64>().ok())
        {
            guild_ids.push(guild_id);
        }
    }

    guild_ids.sort_unstable();
    Ok(guild_ids)
}

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

#[derive(Clone, Debug, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryCacheStore {
    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    pub async fn set(&self, key: &str, value: Vec<u8>) -> anyhow::Result<()> {
        self.entries.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    pub async fn del_prefix(&self, prefix: &str) -> anyhow::Result<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before - entries.len())
    }
}

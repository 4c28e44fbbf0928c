use anyhow::{anyhow, Result};
#[cfg(feature = "sqlite")]
pub mod sqlite;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use dwdx_config::{StoreBackend, StoreConfig};
use dwdx_core::{EntryMeta, StateStore, StateValue};

/// One entry as held by the in-process stores. A never-written entry has
/// no `value` key on disk; a written JSON null stays `Some(StateValue::Null)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredEntry {
    pub meta: EntryMeta,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub value: Option<StateValue>,
}

fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<StateValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    StateValue::deserialize(deserializer).map(Some)
}

/// Volatile store; counts creates and writes
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
    creates: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::Relaxed)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub async fn entry(&self, path: &str) -> Option<StoredEntry> {
        self.entries.read().await.get(path).cloned()
    }

    pub async fn value(&self, path: &str) -> Option<StateValue> {
        self.entry(path).await.and_then(|e| e.value)
    }

    /// Sorted copy of every entry
    pub async fn snapshot(&self) -> BTreeMap<String, StoredEntry> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStore {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(path))
    }

    async fn create(&self, path: &str, meta: &EntryMeta) -> Result<()> {
        self.creates.fetch_add(1, Ordering::Relaxed);
        self.entries
            .write()
            .await
            .entry(path.to_string())
            .or_insert_with(|| StoredEntry {
                meta: meta.clone(),
                value: None,
            });
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<StateValue>> {
        Ok(self.value(path).await)
    }

    async fn set(&self, path: &str, value: &StateValue) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(path)
            .ok_or_else(|| anyhow!("no entry at {}", path))?;
        entry.value = Some(value.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Entries kept in memory and rewritten to `states.json` after every change
pub struct FsStore {
    file: PathBuf,
    entries: RwLock<BTreeMap<String, StoredEntry>>,
}

impl FsStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir)?;
        let file = dir.join("states.json");
        let entries = if file.exists() {
            serde_json::from_str(&fs::read_to_string(&file)?)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            file,
            entries: RwLock::new(entries),
        })
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    fn persist(&self, entries: &BTreeMap<String, StoredEntry>) -> Result<()> {
        let tmp = self.file.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.file)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateStore for FsStore {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(path))
    }

    async fn create(&self, path: &str, meta: &EntryMeta) -> Result<()> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(path) {
            return Ok(());
        }
        entries.insert(
            path.to_string(),
            StoredEntry {
                meta: meta.clone(),
                value: None,
            },
        );
        self.persist(&entries)
    }

    async fn get(&self, path: &str) -> Result<Option<StateValue>> {
        Ok(self
            .entries
            .read()
            .await
            .get(path)
            .and_then(|e| e.value.clone()))
    }

    async fn set(&self, path: &str, value: &StateValue) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(path)
            .ok_or_else(|| anyhow!("no entry at {}", path))?;
        entry.value = Some(value.clone());
        self.persist(&entries)
    }
}

/// Build the store selected in the configuration
pub fn open_store(cfg: &StoreConfig) -> Result<Arc<dyn StateStore>> {
    let store: Arc<dyn StateStore> = match cfg.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Fs => Arc::new(FsStore::new(&cfg.path)?),
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => Arc::new(sqlite::SqliteStore::new(&cfg.path)?),
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite => return Err(anyhow!("built without the sqlite feature")),
    };
    tracing::info!(backend = ?cfg.backend, path = %cfg.path, "state store opened");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwdx_core::{StateWriter, ValueKind, WriteOutcome};

    fn meta() -> EntryMeta {
        EntryMeta::value("temperature", ValueKind::Number)
    }

    #[tokio::test]
    async fn memory_store_counts() {
        let store = Arc::new(MemoryStore::new());
        let writer = StateWriter::new(store.clone());

        writer.ensure_entry("a", &meta()).await.unwrap();
        writer.ensure_entry("a", &meta()).await.unwrap();
        assert_eq!(
            writer.write_if_changed("a", &StateValue::Number(1.0)).await,
            WriteOutcome::Written
        );
        assert_eq!(
            writer.write_if_changed("a", &StateValue::Number(1.0)).await,
            WriteOutcome::Unchanged
        );

        assert_eq!(store.create_count(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn set_without_entry_fails() {
        let store = MemoryStore::new();
        assert!(store.set("nope", &StateValue::Null).await.is_err());
    }

    #[tokio::test]
    async fn fs_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FsStore::new(dir.path()).unwrap();
            store.create("dwdWeather.X.t", &meta()).await.unwrap();
            store
                .set("dwdWeather.X.t", &StateValue::Text("5.3".into()))
                .await
                .unwrap();
        }
        let content = std::fs::read_to_string(dir.path().join("states.json")).unwrap();
        assert!(content.contains("dwdWeather.X.t"));

        let reopened = FsStore::new(dir.path()).unwrap();
        assert!(reopened.exists("dwdWeather.X.t").await.unwrap());
        assert_eq!(
            reopened.get("dwdWeather.X.t").await.unwrap(),
            Some(StateValue::Text("5.3".into()))
        );
    }

    #[tokio::test]
    async fn fs_store_keeps_null_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FsStore::new(dir.path()).unwrap();
            store.create("written", &meta()).await.unwrap();
            store.set("written", &StateValue::Null).await.unwrap();
            store.create("fresh", &meta()).await.unwrap();
        }

        let reopened = Arc::new(FsStore::new(dir.path()).unwrap());
        assert_eq!(reopened.get("written").await.unwrap(), Some(StateValue::Null));
        assert_eq!(reopened.get("fresh").await.unwrap(), None);

        let writer = StateWriter::new(reopened);
        assert_eq!(
            writer.write_if_changed("written", &StateValue::Null).await,
            WriteOutcome::Unchanged
        );
    }

    #[tokio::test]
    async fn fs_store_keeps_first_meta() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        store.create("p", &meta()).await.unwrap();
        store
            .create("p", &EntryMeta::value("other", ValueKind::String))
            .await
            .unwrap();
        let entries = store.entries.read().await;
        assert_eq!(entries["p"].meta.name, "temperature");
    }

    #[test]
    fn open_memory_store() {
        let store = open_store(&StoreConfig::default());
        assert!(store.is_ok());
    }
}

use anyhow::Result;

use crate::{EntryMeta, StateValue};

/// Namespaced key-value store the mirrored values end up in.
///
/// Implementations live in `dwdx-sinks`; the store is shared by both
/// pipelines, so every method takes `&self`.
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool>;

    async fn create(&self, path: &str, meta: &EntryMeta) -> Result<()>;

    /// Current value, `None` if the entry is missing or was never written.
    async fn get(&self, path: &str) -> Result<Option<StateValue>>;

    async fn set(&self, path: &str, value: &StateValue) -> Result<()>;
}

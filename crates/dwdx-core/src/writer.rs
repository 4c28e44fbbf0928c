//! Idempotent entry creation and change-only writes

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error};

use crate::{EntryMeta, EntryUpdate, StateStore, StateValue};

/// Result of a single conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
    Failed,
}

/// Counters for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub written: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl WriteStats {
    pub fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => self.written += 1,
            WriteOutcome::Unchanged => self.unchanged += 1,
            WriteOutcome::Failed => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: WriteStats) {
        self.written += other.written;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }

    pub fn total(&self) -> usize {
        self.written + self.unchanged + self.failed
    }
}

/// Sink adapter shared by the forecast and observation pipelines
#[derive(Clone)]
pub struct StateWriter {
    store: Arc<dyn StateStore>,
}

impl StateWriter {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Create the entry unless one already exists. Existing metadata is
    /// never touched.
    pub async fn ensure_entry(&self, path: &str, meta: &EntryMeta) -> Result<()> {
        if !self.store.exists(path).await? {
            self.store.create(path, meta).await?;
            debug!(path, name = %meta.name, "created entry");
        }
        Ok(())
    }

    /// Write `value` if the entry has no value yet or holds a different one.
    /// Store failures are logged and reported as [`WriteOutcome::Failed`].
    pub async fn write_if_changed(&self, path: &str, value: &StateValue) -> WriteOutcome {
        let current = match self.store.get(path).await {
            Ok(current) => current,
            Err(e) => {
                error!(path, error = %e, "failed to read current value");
                return WriteOutcome::Failed;
            }
        };

        if current.as_ref() == Some(value) {
            debug!(path, "value unchanged");
            return WriteOutcome::Unchanged;
        }

        match self.store.set(path, value).await {
            Ok(()) => {
                debug!(path, %value, "updated value");
                WriteOutcome::Written
            }
            Err(e) => {
                error!(path, error = %e, "failed to write value");
                WriteOutcome::Failed
            }
        }
    }

    pub async fn apply(&self, update: &EntryUpdate) -> WriteOutcome {
        if let Err(e) = self.ensure_entry(&update.path, &update.meta).await {
            error!(path = %update.path, error = %e, "failed to create entry");
            return WriteOutcome::Failed;
        }
        self.write_if_changed(&update.path, &update.value).await
    }

    /// Apply a batch in order; one failing entry never stops the rest.
    pub async fn apply_all(&self, updates: &[EntryUpdate]) -> WriteStats {
        let mut stats = WriteStats::default();
        for update in updates {
            stats.record(self.apply(update).await);
        }
        stats
    }
}

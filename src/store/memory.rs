use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::models::Submission;
use crate::store::{Snapshot, StoreError, SubmissionId, SubmissionStore};

/// Process-local store. The default backend, and the double the test suite
/// runs against. Ids are UUIDv7 strings, so they sort by creation time and
/// are never handed out twice.
pub struct MemoryStore {
    entries: RwLock<BTreeMap<SubmissionId, Submission>>,
    changes: watch::Sender<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(Snapshot::default());
        Self {
            entries: RwLock::new(BTreeMap::new()),
            changes,
        }
    }

    fn publish(&self, entries: &BTreeMap<SubmissionId, Submission>) {
        self.changes.send_replace(Arc::new(entries.clone()));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create(&self, record: &Submission) -> Result<SubmissionId, StoreError> {
        let id = Uuid::now_v7().to_string();
        let mut entries = self.entries.write().await;
        entries.insert(id.clone(), record.clone());
        self.publish(&entries);
        Ok(id)
    }

    async fn read_all(&self) -> Result<BTreeMap<SubmissionId, Submission>, StoreError> {
        Ok(self.entries.read().await.clone())
    }

    async fn read_one(&self, id: &str) -> Result<Option<Submission>, StoreError> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn replace(&self, id: &str, record: &Submission) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(id.to_string(), record.clone());
        self.publish(&entries);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(id);
        self.publish(&entries);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.changes.subscribe()
    }
}

pub mod memory;
pub mod remote;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::config::StoreConfig;
use crate::models::Submission;

/// Opaque key assigned by the storage layer at creation. Stable for the
/// record's lifetime and never reused after deletion.
pub type SubmissionId = String;

/// Full current contents of the collection, republished on every change.
pub type Snapshot = Arc<BTreeMap<SubmissionId, Submission>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("store returned malformed data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Gateway to the `submissions` collection. One operation, one attempt:
/// failures surface to the caller, which must not advance UI-visible state.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn create(&self, record: &Submission) -> Result<SubmissionId, StoreError>;

    async fn read_all(&self) -> Result<BTreeMap<SubmissionId, Submission>, StoreError>;

    async fn read_one(&self, id: &str) -> Result<Option<Submission>, StoreError>;

    /// Full overwrite of an existing record. Last write wins.
    async fn replace(&self, id: &str, record: &Submission) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Live view of the collection. The receiver holds the latest full
    /// snapshot; dropping it cancels the subscription.
    fn subscribe(&self) -> watch::Receiver<Snapshot>;
}

/// Instantiate the backend named by the configuration.
pub fn build(config: &StoreConfig) -> Arc<dyn SubmissionStore> {
    match config {
        StoreConfig::Memory => {
            tracing::info!("Using in-memory submission store");
            Arc::new(memory::MemoryStore::new())
        }
        StoreConfig::Remote {
            base_url,
            auth_token,
        } => {
            tracing::info!("Using remote submission store at {base_url}");
            remote::RemoteStore::spawn(base_url, auth_token.clone())
        }
    }
}

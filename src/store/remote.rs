use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header;
use serde::Deserialize;
use tokio::sync::watch;

use crate::models::Submission;
use crate::store::{Snapshot, StoreError, SubmissionId, SubmissionStore};

const COLLECTION: &str = "submissions";
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Gateway to the hosted real-time document store. CRUD goes over its REST
/// surface; a background watcher consumes the event stream so `subscribe`
/// always reflects the collection without polling.
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
    changes: watch::Sender<Snapshot>,
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Deserialize)]
struct EventFrame {
    path: String,
    data: serde_json::Value,
}

impl RemoteStore {
    /// Create the store and start its collection watcher. Must be called
    /// from within a Tokio runtime.
    pub fn spawn(base_url: &str, auth_token: Option<String>) -> Arc<Self> {
        let (changes, _) = watch::channel(Snapshot::default());
        let store = Arc::new(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            changes,
        });

        tokio::spawn(watch_collection(store.clone()));
        store
    }

    fn collection_url(&self) -> String {
        self.with_auth(format!("{}/{COLLECTION}.json", self.base_url))
    }

    fn member_url(&self, id: &str) -> String {
        self.with_auth(format!("{}/{COLLECTION}/{id}.json", self.base_url))
    }

    fn with_auth(&self, mut url: String) -> String {
        if let Some(token) = &self.auth_token {
            url.push_str("?auth=");
            url.push_str(token);
        }
        url
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Service {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SubmissionStore for RemoteStore {
    async fn create(&self, record: &Submission) -> Result<SubmissionId, StoreError> {
        let resp = self
            .client
            .post(self.collection_url())
            .json(record)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let push: PushResponse = resp.json().await?;
        Ok(push.name)
    }

    async fn read_all(&self) -> Result<BTreeMap<SubmissionId, Submission>, StoreError> {
        let resp = self.client.get(self.collection_url()).send().await?;
        let resp = check_status(resp).await?;
        // The service returns `null` for an empty collection.
        let all: Option<BTreeMap<SubmissionId, Submission>> = resp.json().await?;
        Ok(all.unwrap_or_default())
    }

    async fn read_one(&self, id: &str) -> Result<Option<Submission>, StoreError> {
        let resp = self.client.get(self.member_url(id)).send().await?;
        let resp = check_status(resp).await?;
        let record: Option<Submission> = resp.json().await?;
        Ok(record)
    }

    async fn replace(&self, id: &str, record: &Submission) -> Result<(), StoreError> {
        let resp = self
            .client
            .put(self.member_url(id))
            .json(record)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let resp = self.client.delete(self.member_url(id)).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.changes.subscribe()
    }
}

/// Standing watcher for the collection's event stream. One-shot user
/// operations never retry, but the subscription outlives transient stream
/// drops, so this loop reconnects after a fixed delay.
async fn watch_collection(store: Arc<RemoteStore>) {
    loop {
        match stream_events(&store).await {
            Ok(()) => tracing::info!("Store event stream ended, reconnecting"),
            Err(e) => tracing::warn!("Store event stream failed: {e}"),
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

async fn stream_events(store: &RemoteStore) -> Result<(), StoreError> {
    let resp = store
        .client
        .get(store.collection_url())
        .header(header::ACCEPT, "text/event-stream")
        .send()
        .await?;
    let resp = check_status(resp).await?;

    let mut snapshot: BTreeMap<SubmissionId, Submission> = BTreeMap::new();
    let mut body = resp.bytes_stream();

    let mut buf = String::new();
    let mut event = String::new();
    let mut data = String::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        buf.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buf.find('\n') {
            let line = buf[..pos].trim_end_matches('\r').to_string();
            buf.drain(..=pos);

            if line.is_empty() {
                // Blank line terminates one event.
                if !event.is_empty() {
                    apply_event(&mut snapshot, &event, &data, store)?;
                }
                event.clear();
                data.clear();
            } else if let Some(value) = line.strip_prefix("event:") {
                event = value.trim().to_string();
            } else if let Some(value) = line.strip_prefix("data:") {
                if !data.is_empty() {
                    data.push('\n');
                }
                data.push_str(value.trim());
            }
        }
    }

    Ok(())
}

fn apply_event(
    snapshot: &mut BTreeMap<SubmissionId, Submission>,
    event: &str,
    data: &str,
    store: &RemoteStore,
) -> Result<(), StoreError> {
    match event {
        "put" | "patch" => {}
        "keep-alive" => return Ok(()),
        "cancel" | "auth_revoked" => {
            return Err(StoreError::Service {
                status: 401,
                body: format!("stream terminated by service: {event}"),
            });
        }
        other => {
            tracing::debug!("Ignoring unknown stream event: {other}");
            return Ok(());
        }
    }

    let frame: EventFrame = serde_json::from_str(data)?;
    let segments: Vec<&str> = frame
        .path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        // Root write: the service sends the whole collection (or null).
        [] => {
            snapshot.clear();
            if let Some(map) = frame.data.as_object() {
                for (id, value) in map {
                    insert_decoded(snapshot, id, value.clone());
                }
            }
        }
        [id] => {
            if event == "put" {
                if frame.data.is_null() {
                    snapshot.remove(*id);
                } else {
                    insert_decoded(snapshot, id, frame.data);
                }
            } else {
                patch_member(snapshot, id, &frame.data);
            }
        }
        // Sub-field write from some other client: splice it into the
        // member's serialized form, then re-decode.
        [id, rest @ ..] => {
            let mut value = snapshot
                .get(*id)
                .and_then(|r| serde_json::to_value(r).ok())
                .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
            splice(&mut value, rest, frame.data);
            insert_decoded(snapshot, id, value);
        }
    }

    store.changes.send_replace(Arc::new(snapshot.clone()));
    Ok(())
}

fn insert_decoded(
    snapshot: &mut BTreeMap<SubmissionId, Submission>,
    id: &str,
    value: serde_json::Value,
) {
    match serde_json::from_value::<Submission>(value) {
        Ok(record) => {
            snapshot.insert(id.to_string(), record);
        }
        // No schema enforcement on the service side; foreign records that
        // lack type/timestamp are skipped rather than poisoning the stream.
        Err(e) => tracing::warn!("Skipping undecodable record {id}: {e}"),
    }
}

fn patch_member(
    snapshot: &mut BTreeMap<SubmissionId, Submission>,
    id: &str,
    patch: &serde_json::Value,
) {
    let mut value = snapshot
        .get(id)
        .and_then(|r| serde_json::to_value(r).ok())
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

    if let (Some(obj), Some(delta)) = (value.as_object_mut(), patch.as_object()) {
        for (key, val) in delta {
            if val.is_null() {
                obj.remove(key);
            } else {
                obj.insert(key.clone(), val.clone());
            }
        }
    }

    insert_decoded(snapshot, id, value);
}

fn splice(value: &mut serde_json::Value, path: &[&str], leaf: serde_json::Value) {
    let Some((head, rest)) = path.split_first() else {
        *value = leaf;
        return;
    };

    if !value.is_object() {
        *value = serde_json::Value::Object(Default::default());
    }
    let Some(obj) = value.as_object_mut() else {
        return;
    };

    if rest.is_empty() && leaf.is_null() {
        obj.remove(*head);
        return;
    }

    let slot = obj
        .entry(head.to_string())
        .or_insert(serde_json::Value::Null);
    splice(slot, rest, leaf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn seeded() -> BTreeMap<SubmissionId, Submission> {
        let mut snapshot = BTreeMap::new();
        let mut fields = BTreeMap::new();
        fields.insert("fb-liked".to_string(), "speed".to_string());
        snapshot.insert(
            "abc".to_string(),
            Submission {
                kind: crate::models::SubmissionKind::Feedback,
                timestamp: Utc::now(),
                fields,
            },
        );
        snapshot
    }

    #[test]
    fn root_put_replaces_collection() {
        let store = RemoteStore {
            client: reqwest::Client::new(),
            base_url: "http://store.invalid".to_string(),
            auth_token: None,
            changes: watch::channel(Snapshot::default()).0,
        };
        let mut snapshot = seeded();

        let data = r#"{"path":"/","data":{"xyz":{"type":"Survey","timestamp":"2024-05-01T12:00:00Z","survey-age":"25-34"}}}"#;
        apply_event(&mut snapshot, "put", data, &store).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key("xyz"));
        assert_eq!(store.changes.subscribe().borrow().len(), 1);
    }

    #[test]
    fn member_put_null_deletes() {
        let store = RemoteStore {
            client: reqwest::Client::new(),
            base_url: "http://store.invalid".to_string(),
            auth_token: None,
            changes: watch::channel(Snapshot::default()).0,
        };
        let mut snapshot = seeded();

        apply_event(&mut snapshot, "put", r#"{"path":"/abc","data":null}"#, &store).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn member_patch_merges_fields() {
        let store = RemoteStore {
            client: reqwest::Client::new(),
            base_url: "http://store.invalid".to_string(),
            auth_token: None,
            changes: watch::channel(Snapshot::default()).0,
        };
        let mut snapshot = seeded();

        let data = r#"{"path":"/abc","data":{"fb-improve":"dark mode"}}"#;
        apply_event(&mut snapshot, "patch", data, &store).unwrap();

        let record = &snapshot["abc"];
        assert_eq!(record.fields["fb-liked"], "speed");
        assert_eq!(record.fields["fb-improve"], "dark mode");
    }

    #[test]
    fn undecodable_member_is_skipped() {
        let store = RemoteStore {
            client: reqwest::Client::new(),
            base_url: "http://store.invalid".to_string(),
            auth_token: None,
            changes: watch::channel(Snapshot::default()).0,
        };
        let mut snapshot = seeded();

        // Missing timestamp: not a valid record.
        let data = r#"{"path":"/broken","data":{"type":"Feedback"}}"#;
        apply_event(&mut snapshot, "put", data, &store).unwrap();

        assert!(!snapshot.contains_key("broken"));
        assert!(snapshot.contains_key("abc"));
    }

    #[test]
    fn auth_token_is_appended() {
        let store = RemoteStore {
            client: reqwest::Client::new(),
            base_url: "http://store.invalid".to_string(),
            auth_token: Some("tok".to_string()),
            changes: watch::channel(Snapshot::default()).0,
        };

        assert_eq!(
            store.collection_url(),
            "http://store.invalid/submissions.json?auth=tok"
        );
        assert_eq!(
            store.member_url("abc"),
            "http://store.invalid/submissions/abc.json?auth=tok"
        );
    }
}

//! Posting persistence collaborators.
//!
//! The harvest pipeline never persists anything itself; it hands each
//! de-duplicated posting to a [`PostingStore`]. The store is expected to upsert
//! on `(source, external_id)`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Posting, SourceId};

/// Errors from saving one posting.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store rejected posting with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Save-one-posting capability.
#[async_trait]
pub trait PostingStore: Send + Sync {
    async fn save(&self, posting: &Posting) -> Result<(), StoreError>;
}

/// Document store reached over HTTP.
#[derive(Clone)]
pub struct HttpPostingStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPostingStore {
    /// `base_url` is the database service root, e.g. `http://localhost:8081`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/vacancies", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PostingStore for HttpPostingStore {
    async fn save(&self, posting: &Posting) -> Result<(), StoreError> {
        let response = self.client.post(&self.endpoint).json(posting).send().await?;
        let status = response.status();
        if status.is_success() {
            debug!("stored {}/{}", posting.source, posting.external_id);
            return Ok(());
        }

        // Body is best-effort context for the issue message.
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        })
    }
}

/// In-process store. Used for dry runs and tests.
#[derive(Clone, Default)]
pub struct MemoryPostingStore {
    postings: Arc<RwLock<HashMap<(SourceId, String), Posting>>>,
}

impl MemoryPostingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.postings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.postings.read().await.is_empty()
    }

    pub async fn get(&self, source: SourceId, external_id: &str) -> Option<Posting> {
        self.postings
            .read()
            .await
            .get(&(source, external_id.to_string()))
            .cloned()
    }

    /// Every stored posting, sorted by key.
    pub async fn all(&self) -> Vec<Posting> {
        let mut postings: Vec<Posting> = self.postings.read().await.values().cloned().collect();
        postings.sort_by(|a, b| a.key().cmp(&b.key()));
        postings
    }
}

#[async_trait]
impl PostingStore for MemoryPostingStore {
    async fn save(&self, posting: &Posting) -> Result<(), StoreError> {
        let mut postings = self.postings.write().await;
        let key = (posting.source, posting.external_id.clone());
        match postings.get_mut(&key) {
            Some(existing) => {
                let harvested_at = existing.harvested_at;
                *existing = posting.clone();
                existing.harvested_at = harvested_at;
            }
            None => {
                postings.insert(key, posting.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(source: SourceId, id: &str, title: &str) -> Posting {
        let mut p = Posting::new(source, id.to_string(), format!("https://example.com/{}", id));
        p.title = title.to_string();
        p
    }

    #[tokio::test]
    async fn test_memory_store_upserts_by_key() {
        let store = MemoryPostingStore::new();
        let first = posting(SourceId::Hh, "1", "Designer");
        store.save(&first).await.unwrap();

        let mut second = posting(SourceId::Hh, "1", "Senior designer");
        second.harvested_at = first.harvested_at + chrono::Duration::hours(1);
        store.save(&second).await.unwrap();
        store.save(&posting(SourceId::Habr, "1", "Designer")).await.unwrap();

        assert_eq!(store.len().await, 2);
        let stored = store.get(SourceId::Hh, "1").await.unwrap();
        assert_eq!(stored.title, "Senior designer");
        assert_eq!(stored.harvested_at, first.harvested_at);
    }

    #[tokio::test]
    async fn test_memory_store_all_is_sorted() {
        let store = MemoryPostingStore::new();
        store.save(&posting(SourceId::Habr, "2", "b")).await.unwrap();
        store.save(&posting(SourceId::Hh, "9", "a")).await.unwrap();
        let keys: Vec<_> = store
            .all()
            .await
            .iter()
            .map(|p| (p.source, p.external_id.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![(SourceId::Hh, "9".to_string()), (SourceId::Habr, "2".to_string())]
        );
    }

    #[test]
    fn test_http_store_endpoint() {
        let store = HttpPostingStore::new("http://db:8081/", Duration::from_secs(5)).unwrap();
        assert_eq!(store.endpoint(), "http://db:8081/api/vacancies");
    }

    #[tokio::test]
    async fn test_http_store_unreachable_is_transport_error() {
        let store = HttpPostingStore::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = store
            .save(&posting(SourceId::Hh, "1", "Designer"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }
}

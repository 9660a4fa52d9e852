use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::TraceStoreError;
use crate::domain::models::TraceEntry;
use crate::domain::ports::TraceStore;

/// Entries plus a request id index; shared with the file store.
#[derive(Debug, Default)]
pub(super) struct TraceLog {
    pub(super) entries: Vec<TraceEntry>,
    index: HashMap<String, usize>,
}

impl TraceLog {
    pub(super) fn append(&mut self, entry: TraceEntry) -> Result<(), TraceStoreError> {
        if self.contains(&entry.request_id) {
            return Err(TraceStoreError::DuplicateRequestId(entry.request_id));
        }
        self.index.insert(entry.request_id.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub(super) fn contains(&self, request_id: &str) -> bool {
        self.index.contains_key(request_id)
    }

    pub(super) fn get(&self, request_id: &str) -> Option<TraceEntry> {
        self.index
            .get(request_id)
            .and_then(|&i| self.entries.get(i))
            .cloned()
    }

    pub(super) fn recent(&self, limit: usize) -> Vec<TraceEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }
}

/// In-memory, append-only trace log.
///
/// Entries are kept for the life of the process; nothing is evicted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTraceStore {
    log: Arc<RwLock<TraceLog>>,
}

impl InMemoryTraceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TraceStore for InMemoryTraceStore {
    async fn append(&self, entry: TraceEntry) -> Result<(), TraceStoreError> {
        self.log.write().await.append(entry)
    }

    async fn get(&self, request_id: &str) -> Result<Option<TraceEntry>, TraceStoreError> {
        Ok(self.log.read().await.get(request_id))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TraceEntry>, TraceStoreError> {
        Ok(self.log.read().await.recent(limit))
    }

    async fn len(&self) -> Result<usize, TraceStoreError> {
        Ok(self.log.read().await.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TraceOutcome;

    #[tokio::test]
    async fn test_append_and_get() {
        let store = InMemoryTraceStore::new();
        store
            .append(TraceEntry::new("req-1", TraceOutcome::Success).with_domains(vec!["investments".into()]))
            .await
            .unwrap();

        let entry = store.get("req-1").await.unwrap().unwrap();
        assert_eq!(entry.domain_ids_consulted, vec!["investments"]);
        assert!(store.contains("req-1").await.unwrap());
        assert!(store.get("req-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_request_id_rejected() {
        let store = InMemoryTraceStore::new();
        store.append(TraceEntry::new("req-1", TraceOutcome::Success)).await.unwrap();

        let err = store
            .append(TraceEntry::new("req-1", TraceOutcome::Failure))
            .await
            .unwrap_err();
        assert_eq!(err, TraceStoreError::DuplicateRequestId("req-1".into()));

        // the original entry is untouched
        let entry = store.get("req-1").await.unwrap().unwrap();
        assert_eq!(entry.outcome, TraceOutcome::Success);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let store = InMemoryTraceStore::new();
        for i in 0..5 {
            store
                .append(TraceEntry::new(format!("req-{i}"), TraceOutcome::Success))
                .await
                .unwrap();
        }

        let recent: Vec<_> = store
            .recent(3)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.request_id)
            .collect();
        assert_eq!(recent, vec!["req-4", "req-3", "req-2"]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_all_recorded() {
        let store = Arc::new(InMemoryTraceStore::new());
        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .append(TraceEntry::new(format!("req-{i}"), TraceOutcome::Success))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.len().await.unwrap(), 50);
    }
}

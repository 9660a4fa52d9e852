use async_trait::async_trait;

use crate::domain::errors::TraceStoreError;
use crate::domain::models::TraceEntry;

/// Append-only storage for trace entries
///
/// Implementations must:
/// - Reject a second entry with an already recorded `request_id`
/// - Never mutate or remove an appended entry
/// - Keep each append atomic under concurrent writers
#[async_trait]
pub trait TraceStore: Send + Sync {
    /// Append one entry
    ///
    /// # Errors
    /// Returns error if:
    /// - The request id is already recorded
    /// - The backing store cannot be written
    async fn append(&self, entry: TraceEntry) -> Result<(), TraceStoreError>;

    /// Look up an entry by request id
    async fn get(&self, request_id: &str) -> Result<Option<TraceEntry>, TraceStoreError>;

    /// Whether `request_id` has been recorded
    async fn contains(&self, request_id: &str) -> Result<bool, TraceStoreError> {
        Ok(self.get(request_id).await?.is_some())
    }

    /// Most recent entries, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<TraceEntry>, TraceStoreError>;

    /// Number of recorded entries
    async fn len(&self) -> Result<usize, TraceStoreError>;

    /// Flush buffered writes (teardown hook)
    async fn flush(&self) -> Result<(), TraceStoreError> {
        Ok(())
    }
}

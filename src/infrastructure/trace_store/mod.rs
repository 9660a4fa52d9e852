//! Trace store implementations.
//!
//! - [`InMemoryTraceStore`]: process-lifetime log, the default
//! - [`JsonlTraceStore`]: one JSON object per line, survives restarts

mod jsonl;
mod memory;

pub use jsonl::JsonlTraceStore;
pub use memory::InMemoryTraceStore;

use std::path::Path;
use std::sync::Arc;

use crate::domain::errors::TraceStoreError;
use crate::domain::models::TraceStoreKind;
use crate::domain::ports::TraceStore;

/// Build the configured trace store.
///
/// # Errors
/// Returns error if the file store cannot open or replay its log.
pub async fn open_trace_store(
    kind: TraceStoreKind,
    path: Option<&Path>,
) -> Result<Arc<dyn TraceStore>, TraceStoreError> {
    match (kind, path) {
        (TraceStoreKind::Memory, _) => Ok(Arc::new(InMemoryTraceStore::new())),
        (TraceStoreKind::File, Some(path)) => Ok(Arc::new(JsonlTraceStore::open(path).await?)),
        (TraceStoreKind::File, None) => Err(TraceStoreError::Io(
            "file trace store requires trace.path".to_string(),
        )),
    }
}

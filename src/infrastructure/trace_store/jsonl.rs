use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::memory::TraceLog;
use crate::domain::errors::TraceStoreError;
use crate::domain::models::TraceEntry;
use crate::domain::ports::TraceStore;

struct JsonlState {
    log: TraceLog,
    file: File,
}

/// Append-only trace log persisted as JSON lines.
///
/// Existing entries are replayed on open, so request ids stay unique across
/// restarts. Each append is written and flushed before it becomes visible.
pub struct JsonlTraceStore {
    path: PathBuf,
    state: Mutex<JsonlState>,
}

impl std::fmt::Debug for JsonlTraceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlTraceStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl JsonlTraceStore {
    /// Open (or create) the log at `path` and replay its entries.
    ///
    /// Lines that do not parse are skipped with a warning.
    ///
    /// # Errors
    /// Returns error if the file or its parent directory cannot be created
    /// or read.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TraceStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut log = TraceLog::default();
        match fs::read_to_string(&path).await {
            Ok(content) => {
                for (line_no, line) in content.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let replayed = serde_json::from_str::<TraceEntry>(line)
                        .map_err(TraceStoreError::from)
                        .and_then(|entry| log.append(entry));
                    if let Err(e) = replayed {
                        tracing::warn!(
                            path = %path.display(),
                            line = line_no + 1,
                            error = %e,
                            "Skipping unreadable trace log line"
                        );
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        tracing::debug!(
            path = %path.display(),
            entries = log.entries.len(),
            "Opened trace log"
        );

        Ok(Self {
            path,
            state: Mutex::new(JsonlState { log, file }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TraceStore for JsonlTraceStore {
    async fn append(&self, entry: TraceEntry) -> Result<(), TraceStoreError> {
        let mut state = self.state.lock().await;
        if state.log.contains(&entry.request_id) {
            return Err(TraceStoreError::DuplicateRequestId(entry.request_id));
        }

        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        state.file.write_all(line.as_bytes()).await?;
        state.file.flush().await?;

        state.log.append(entry)
    }

    async fn get(&self, request_id: &str) -> Result<Option<TraceEntry>, TraceStoreError> {
        Ok(self.state.lock().await.log.get(request_id))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TraceEntry>, TraceStoreError> {
        Ok(self.state.lock().await.log.recent(limit))
    }

    async fn len(&self) -> Result<usize, TraceStoreError> {
        Ok(self.state.lock().await.log.entries.len())
    }

    async fn flush(&self) -> Result<(), TraceStoreError> {
        let state = self.state.lock().await;
        state.file.sync_all().await?;
        Ok(())
    }
}

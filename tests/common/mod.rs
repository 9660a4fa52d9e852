//! Common test utilities for integration tests
//!
//! Shared fixtures and helpers for building domain model directories and
//! context services.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mcp_context::domain::models::RegistryConfig;
use mcp_context::infrastructure::trace_store::InMemoryTraceStore;
use mcp_context::services::{ContextService, DomainModelRegistry};
use tempfile::TempDir;

/// The example domain models shipped under `.mcp/domain-models`.
pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(".mcp/domain-models")
}

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Minimal valid markdown document.
pub fn document(domain_id: &str, version: &str, keywords: &[&str]) -> String {
    let mut doc = format!(
        "# Domain\n\n{domain_id}\n\n## Description\n\n{domain_id} at {version}.\n\n## Version\n\n{version}\n"
    );
    if !keywords.is_empty() {
        doc.push_str("\n## Expertise\n\n");
        for keyword in keywords {
            doc.push_str(&format!("- {keyword}\n"));
        }
    }
    doc
}

/// Write `content` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(&path, content).expect("Failed to write fixture");
    path
}

/// Registry over `dir` with eager loading, already loaded.
pub async fn loaded_registry(dir: &Path) -> Arc<DomainModelRegistry> {
    let registry = Arc::new(DomainModelRegistry::new(RegistryConfig::new(dir)));
    registry.load().await.expect("Failed to load registry");
    registry
}

/// Context service over `dir` with an in-memory trace store.
pub async fn service(dir: &Path) -> ContextService {
    ContextService::new(
        loaded_registry(dir).await,
        Arc::new(InMemoryTraceStore::new()),
    )
}

/// Setup test logging
///
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

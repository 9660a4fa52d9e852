//! Startup and teardown of the context service.
//!
//! There is no process-wide instance: callers build a [`ContextService`]
//! with [`initialize`] and pass it to whatever needs it.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::errors::{ContextError, RegistryError, TraceStoreError};
use crate::infrastructure::config::{ConfigError, ConfigResolver, ResolvedConfig};
use crate::infrastructure::trace_store::open_trace_store;
use crate::services::{ContextService, DomainModelRegistry};

/// Startup and teardown failures
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Trace store error: {0}")]
    TraceStore(#[from] TraceStoreError),

    #[error("Shutdown failed: {0}")]
    Shutdown(#[from] ContextError),
}

/// Resolve configuration, load the registry and open the trace store.
///
/// # Errors
/// Configuration errors and a missing domain models directory are fatal.
/// Individual files that fail to load are only logged.
pub async fn initialize(resolver: &ConfigResolver) -> Result<ContextService, LifecycleError> {
    let resolved = resolver.resolve()?;
    start(&resolved).await
}

/// Build the service from already resolved configuration.
///
/// # Errors
/// Returns error if the registry directory is missing or the trace store
/// cannot be opened.
pub async fn start(resolved: &ResolvedConfig) -> Result<ContextService, LifecycleError> {
    let registry = Arc::new(DomainModelRegistry::new(resolved.registry.clone()));
    let report = registry.load().await?;

    if !report.is_clean() {
        tracing::warn!(
            failures = report.failures.len(),
            "Some domain models failed to load"
        );
    }

    let trace_path = resolved.trace_path();
    let traces = open_trace_store(resolved.mcp.trace.store, trace_path.as_deref()).await?;

    tracing::info!(
        dir = %resolved.registry.domain_models_dir.display(),
        preload = resolved.registry.preload,
        loaded = report.loaded.len(),
        trace_store = ?resolved.mcp.trace.store,
        "Context service initialized"
    );

    Ok(ContextService::new(registry, traces))
}

/// Flush the trace store before exit.
///
/// # Errors
/// Returns error if buffered trace entries cannot be written.
pub async fn shutdown(service: &ContextService) -> Result<(), LifecycleError> {
    service.shutdown().await?;
    Ok(())
}

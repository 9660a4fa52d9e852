//! Trace log command handler

use anyhow::{Context, Result};

use crate::cli::output::{print_json, TableFormatter};
use crate::services::ContextService;

/// Handle `traces [--limit N]`, newest first
pub async fn handle_traces(service: &ContextService, limit: usize, json: bool) -> Result<()> {
    let traces = service
        .recent_traces(limit)
        .await
        .context("Failed to read trace log")?;

    if json {
        return print_json(&traces);
    }

    if traces.is_empty() {
        println!("No traces recorded.");
        return Ok(());
    }

    let total = service
        .trace_count()
        .await
        .context("Failed to read trace log")?;
    println!("{}", TableFormatter::new().format_traces(&traces));
    println!("\nShowing {} of {total} trace{}", traces.len(), if total == 1 { "" } else { "s" });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::models::{ContextQuery, RegistryConfig};
    use crate::domain::ports::TraceStore;
    use crate::infrastructure::trace_store::InMemoryTraceStore;
    use crate::services::DomainModelRegistry;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_traces_lists_recorded_calls() {
        let temp = TempDir::new().unwrap();
        let registry = Arc::new(DomainModelRegistry::new(RegistryConfig::new(temp.path())));
        registry.load().await.unwrap();
        let store = Arc::new(InMemoryTraceStore::new());
        let service = ContextService::new(registry, Arc::clone(&store) as Arc<dyn TraceStore>);

        handle_traces(&service, 5, false).await.unwrap();

        for id in ["req-1", "req-2"] {
            let query = ContextQuery {
                request_id: Some(id.to_string()),
                domain_ids: vec!["unknown".into()],
                keywords: vec![],
            };
            let _ = service.resolve(query).await;
        }

        assert_eq!(store.len().await.unwrap(), 2);
        handle_traces(&service, 1, false).await.unwrap();
        handle_traces(&service, 5, true).await.unwrap();
    }
}

//! Context and trace layer.
//!
//! Resolves orchestrator queries against the registry and records exactly
//! one [`TraceEntry`] per `resolve` call, whatever the outcome. Resolution
//! runs in its own task so a caller that drops the future still gets its
//! trace written.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::domain::errors::{ContextError, ContextResult, RegistryError, TraceStoreError};
use crate::domain::models::{
    ContextBundle, ContextQuery, DomainContext, DomainSummary, TraceEntry, TraceOutcome,
};
use crate::domain::ports::TraceStore;
use crate::services::registry::DomainModelRegistry;

/// What a successful resolution produced, before tracing.
struct Resolution {
    outcome: TraceOutcome,
    detail: String,
    domains: Vec<DomainContext>,
}

/// Consumer API over the registry and the trace log.
#[derive(Clone)]
pub struct ContextService {
    registry: Arc<DomainModelRegistry>,
    traces: Arc<dyn TraceStore>,
}

impl std::fmt::Debug for ContextService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextService")
            .field("registry", &self.registry.config().domain_models_dir)
            .finish_non_exhaustive()
    }
}

impl ContextService {
    pub fn new(registry: Arc<DomainModelRegistry>, traces: Arc<dyn TraceStore>) -> Self {
        Self { registry, traces }
    }

    pub fn registry(&self) -> &Arc<DomainModelRegistry> {
        &self.registry
    }

    /// Resolve a query to a context bundle.
    ///
    /// Explicit `domain_ids` win over `keywords`. A query where only some
    /// ids resolve succeeds with a `partial` outcome.
    ///
    /// # Errors
    /// - `EmptyQuery` when the query names neither ids nor keywords
    /// - `UnknownDomains` when none of the ids resolve
    /// - `NoMatch` when no domain matches the keywords
    /// - `DuplicateRequestId` when the supplied request id is already traced
    /// - `Registry` when a deferred registry load fails
    pub async fn resolve(&self, query: ContextQuery) -> ContextResult<ContextBundle> {
        let registry = Arc::clone(&self.registry);
        let traces = Arc::clone(&self.traces);

        tokio::spawn(async move { resolve_and_trace(&registry, traces.as_ref(), query).await })
            .await
            .map_err(|e| ContextError::Internal(e.to_string()))?
    }

    /// Summaries of every loaded domain model, ascending by id.
    ///
    /// # Errors
    /// Returns `Registry` when a deferred registry load fails.
    pub async fn list_domains(&self) -> ContextResult<Vec<DomainSummary>> {
        let descriptors = self.registry.list().await?;
        Ok(descriptors.iter().map(|d| d.summary()).collect())
    }

    /// # Errors
    /// Returns `TraceNotFound` for unknown request ids.
    pub async fn get_trace(&self, request_id: &str) -> ContextResult<TraceEntry> {
        self.traces
            .get(request_id)
            .await?
            .ok_or_else(|| ContextError::TraceNotFound(request_id.to_string()))
    }

    /// Most recent trace entries, newest first.
    ///
    /// # Errors
    /// Returns `TraceStore` if the store cannot be read.
    pub async fn recent_traces(&self, limit: usize) -> ContextResult<Vec<TraceEntry>> {
        Ok(self.traces.recent(limit).await?)
    }

    /// # Errors
    /// Returns `TraceStore` if the store cannot be read.
    pub async fn trace_count(&self) -> ContextResult<usize> {
        Ok(self.traces.len().await?)
    }

    /// Flush the trace store. Call once before the process exits.
    ///
    /// # Errors
    /// Returns `TraceStore` if buffered entries cannot be written.
    pub async fn shutdown(&self) -> ContextResult<()> {
        self.traces.flush().await?;
        tracing::info!("Context service shut down");
        Ok(())
    }
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

async fn resolve_and_trace(
    registry: &DomainModelRegistry,
    traces: &dyn TraceStore,
    query: ContextQuery,
) -> ContextResult<ContextBundle> {
    let started = Instant::now();
    let supplied = query
        .request_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string);

    let (request_id, resolution) = match supplied {
        Some(id) => {
            if traces.contains(&id).await? {
                (new_request_id(), Err(ContextError::DuplicateRequestId(id)))
            } else {
                let resolution = resolve_domains(registry, &query).await;
                (id, resolution)
            }
        }
        None => (new_request_id(), resolve_domains(registry, &query).await),
    };

    let entry = trace_entry(&request_id, &query, &resolution, started);
    match traces.append(entry).await {
        Ok(()) => {}
        // lost a race with a concurrent call using the same supplied id
        Err(TraceStoreError::DuplicateRequestId(id)) => {
            let error = ContextError::DuplicateRequestId(id);
            let retry = trace_entry(&new_request_id(), &query, &Err(error.clone()), started);
            traces.append(retry).await?;
            return Err(error);
        }
        Err(e) => return Err(e.into()),
    }

    match resolution {
        Ok(resolution) => {
            tracing::info!(
                request_id = %request_id,
                outcome = %resolution.outcome,
                domains = resolution.domains.len(),
                "Resolved context"
            );
            Ok(ContextBundle {
                request_id,
                outcome: resolution.outcome,
                detail: resolution.detail,
                domains: resolution.domains,
            })
        }
        Err(error) => {
            tracing::info!(request_id = %request_id, error = %error, "Context resolution failed");
            Err(error)
        }
    }
}

fn trace_entry(
    request_id: &str,
    query: &ContextQuery,
    resolution: &ContextResult<Resolution>,
    started: Instant,
) -> TraceEntry {
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let (outcome, domains, detail) = match resolution {
        Ok(r) => (
            r.outcome,
            r.domains.iter().map(|d| d.domain_id.clone()).collect(),
            r.detail.clone(),
        ),
        Err(error) => (TraceOutcome::Failure, Vec::new(), error.to_string()),
    };

    TraceEntry::new(request_id, outcome)
        .with_domains(domains)
        .with_detail(detail)
        .with_query(query.domain_ids.clone(), query.keywords.clone())
        .with_duration_ms(duration_ms)
}

async fn resolve_domains(
    registry: &DomainModelRegistry,
    query: &ContextQuery,
) -> ContextResult<Resolution> {
    let mut seen = HashSet::new();
    let ids: Vec<&str> = query
        .domain_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .collect();

    if !ids.is_empty() {
        return resolve_ids(registry, &ids).await;
    }

    let keywords: HashSet<String> = query
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.is_empty() {
        return Err(ContextError::EmptyQuery);
    }

    let domains: Vec<DomainContext> = registry
        .list()
        .await?
        .iter()
        .filter(|d| d.matches_keywords(&keywords))
        .map(|d| DomainContext::from(d.as_ref()))
        .collect();

    if domains.is_empty() {
        return Err(ContextError::NoMatch(query.keywords.clone()));
    }

    Ok(Resolution {
        outcome: TraceOutcome::Success,
        detail: String::new(),
        domains,
    })
}

async fn resolve_ids(registry: &DomainModelRegistry, ids: &[&str]) -> ContextResult<Resolution> {
    let mut domains = Vec::new();
    let mut missing = Vec::new();

    for id in ids {
        match registry.get(id).await {
            Ok(descriptor) => domains.push(DomainContext::from(descriptor.as_ref())),
            Err(RegistryError::NotFound(_)) => missing.push((*id).to_string()),
            Err(e) => return Err(e.into()),
        }
    }

    if domains.is_empty() {
        return Err(ContextError::UnknownDomains(missing));
    }

    let (outcome, detail) = if missing.is_empty() {
        (TraceOutcome::Success, String::new())
    } else {
        (
            TraceOutcome::Partial,
            format!("missing domain ids: {}", missing.join(", ")),
        )
    };

    Ok(Resolution {
        outcome,
        detail,
        domains,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RegistryConfig;
    use crate::infrastructure::trace_store::InMemoryTraceStore;
    use std::fs;
    use tempfile::TempDir;

    async fn service(temp: &TempDir) -> ContextService {
        let doc = |id: &str, keyword: &str| {
            format!(
                "# Domain\n\n{id}\n\n## Description\n\n{id} domain\n\n## Version\n\n1.0.0\n\n## Rules\n\n- {id}_rules\n\n## Expertise\n\n- {keyword}\n"
            )
        };
        fs::write(temp.path().join("investments.md"), doc("investments", "Finance")).unwrap();
        fs::write(temp.path().join("legal_docs.md"), doc("legal_docs", "contracts")).unwrap();

        let registry = Arc::new(DomainModelRegistry::new(RegistryConfig::new(temp.path())));
        registry.load().await.unwrap();
        ContextService::new(registry, Arc::new(InMemoryTraceStore::new()))
    }

    #[tokio::test]
    async fn test_explicit_ids_win_over_keywords() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp).await;

        let query = ContextQuery {
            request_id: None,
            domain_ids: vec!["legal_docs".into()],
            keywords: vec!["finance".into()],
        };
        let bundle = service.resolve(query).await.unwrap();
        assert_eq!(bundle.domain_ids(), vec!["legal_docs"]);
        assert_eq!(bundle.rule_sets(), vec!["legal_docs_rules"]);
        assert!(Uuid::parse_str(&bundle.request_id).is_ok());
    }

    #[tokio::test]
    async fn test_keyword_match_is_case_insensitive() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp).await;

        let bundle = service
            .resolve(ContextQuery::for_keywords(["FINANCE"]).with_request_id("req-1"))
            .await
            .unwrap();
        assert_eq!(bundle.request_id, "req-1");
        assert_eq!(bundle.domain_ids(), vec!["investments"]);

        let trace = service.get_trace("req-1").await.unwrap();
        assert_eq!(trace.outcome, TraceOutcome::Success);
        assert_eq!(trace.domain_ids_consulted, vec!["investments"]);
        assert_eq!(trace.keywords, vec!["FINANCE"]);
    }

    #[tokio::test]
    async fn test_failures_are_traced() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp).await;

        let err = service
            .resolve(ContextQuery::default().with_request_id("empty"))
            .await
            .unwrap_err();
        assert_eq!(err, ContextError::EmptyQuery);

        let err = service
            .resolve(ContextQuery::for_keywords(["astronomy"]).with_request_id("nomatch"))
            .await
            .unwrap_err();
        assert_eq!(err, ContextError::NoMatch(vec!["astronomy".into()]));

        for id in ["empty", "nomatch"] {
            let trace = service.get_trace(id).await.unwrap();
            assert_eq!(trace.outcome, TraceOutcome::Failure);
            assert!(trace.domain_ids_consulted.is_empty());
        }
        assert_eq!(service.trace_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_request_id_traced_under_new_id() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp).await;

        service
            .resolve(ContextQuery::for_domains(["investments"]).with_request_id("req-1"))
            .await
            .unwrap();
        let err = service
            .resolve(ContextQuery::for_domains(["legal_docs"]).with_request_id("req-1"))
            .await
            .unwrap_err();
        assert_eq!(err, ContextError::DuplicateRequestId("req-1".into()));

        // original trace untouched, second call recorded separately
        let original = service.get_trace("req-1").await.unwrap();
        assert_eq!(original.domain_ids_consulted, vec!["investments"]);

        let recent = service.recent_traces(1).await.unwrap();
        assert_ne!(recent[0].request_id, "req-1");
        assert_eq!(recent[0].outcome, TraceOutcome::Failure);
        assert!(recent[0].detail.contains("req-1"));
        assert_eq!(service.trace_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unknown_trace() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp).await;
        assert_eq!(
            service.get_trace("nope").await.unwrap_err(),
            ContextError::TraceNotFound("nope".into())
        );
    }
}

//! Orchestrator queries and the context bundles returned for them.

use serde::{Deserialize, Serialize};

use super::descriptor::DomainModelDescriptor;
use super::trace::TraceOutcome;

/// A request from the orchestrator.
///
/// Explicit `domain_ids` take precedence; `keywords` are used only when no
/// ids are given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextQuery {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub domain_ids: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ContextQuery {
    pub fn for_domains<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domain_ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn for_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Orchestration-relevant slice of one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainContext {
    pub domain_id: String,
    pub domain_name: String,
    pub version: String,
    pub capabilities: Vec<String>,
    pub tools: Vec<String>,
    pub rule_sets: Vec<String>,
}

impl From<&DomainModelDescriptor> for DomainContext {
    fn from(d: &DomainModelDescriptor) -> Self {
        Self {
            domain_id: d.domain_id.clone(),
            domain_name: d.domain_name.clone(),
            version: d.version.clone(),
            capabilities: d.capabilities.clone(),
            tools: d.tools.clone(),
            rule_sets: d.rule_sets.clone(),
        }
    }
}

/// Aggregated context returned for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBundle {
    pub request_id: String,
    pub outcome: TraceOutcome,
    #[serde(default)]
    pub detail: String,
    pub domains: Vec<DomainContext>,
}

impl ContextBundle {
    pub fn domain_ids(&self) -> Vec<&str> {
        self.domains.iter().map(|d| d.domain_id.as_str()).collect()
    }

    /// Union of rule sets across domains, first occurrence order.
    pub fn rule_sets(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.domains
            .iter()
            .flat_map(|d| d.rule_sets.iter())
            .filter(|r| seen.insert(r.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Union of tools across domains, first occurrence order.
    pub fn tools(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.domains
            .iter()
            .flat_map(|d| d.tools.iter())
            .filter(|t| seen.insert(t.as_str()))
            .map(String::as_str)
            .collect()
    }
}

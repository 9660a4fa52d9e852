//! Trace entries: the audit record of one orchestrator interaction.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a single `resolve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceOutcome {
    Success,
    Partial,
    Failure,
}

impl TraceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failure => "failure",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "success" => Some(Self::Success),
            "partial" => Some(Self::Partial),
            "failure" => Some(Self::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for TraceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record. Only the context layer creates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub request_id: String,
    pub domain_ids_consulted: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub outcome: TraceOutcome,
    /// Free-form diagnostic (missing ids, error message, ...).
    #[serde(default)]
    pub detail: String,
    /// Domain ids the caller asked for explicitly.
    #[serde(default)]
    pub requested_ids: Vec<String>,
    /// Keywords the caller routed by.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl TraceEntry {
    pub fn new(request_id: impl Into<String>, outcome: TraceOutcome) -> Self {
        Self {
            request_id: request_id.into(),
            domain_ids_consulted: Vec::new(),
            timestamp: Utc::now(),
            outcome,
            detail: String::new(),
            requested_ids: Vec::new(),
            keywords: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn with_domains(mut self, domain_ids: Vec<String>) -> Self {
        self.domain_ids_consulted = domain_ids;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_query(mut self, requested_ids: Vec<String>, keywords: Vec<String>) -> Self {
        self.requested_ids = requested_ids;
        self.keywords = keywords;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

//! Domain model descriptor: the normalized form of one domain model document.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source format of a domain model document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Markdown,
    Json,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Json => "json",
        }
    }

    /// Detect the format from a file extension. Returns `None` for files
    /// that are not domain model documents.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Normalized, immutable representation of one domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainModelDescriptor {
    /// Stable registry key, e.g. `investments`.
    pub domain_id: String,
    /// Human-readable display name.
    pub domain_name: String,
    pub description: String,
    /// Semantic version `MAJOR.MINOR.PATCH`.
    pub version: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub rule_sets: Vec<String>,
    /// Routing keywords matched against orchestrator queries.
    #[serde(default)]
    pub expertise_keywords: Vec<String>,
    #[serde(default)]
    pub format: DocumentFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
}

impl DomainModelDescriptor {
    pub fn new(
        domain_id: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let domain_id = domain_id.into();
        Self {
            domain_name: default_display_name(&domain_id),
            domain_id,
            description: description.into(),
            version: version.into(),
            capabilities: Vec::new(),
            tools: Vec::new(),
            rule_sets: Vec::new(),
            expertise_keywords: Vec::new(),
            format: DocumentFormat::Markdown,
            source_path: None,
            loaded_at: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.domain_name = name.into();
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tools.push(tool.into());
        self
    }

    pub fn with_rule_set(mut self, rule_set: impl Into<String>) -> Self {
        self.rule_sets.push(rule_set.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.expertise_keywords.push(keyword.into());
        self
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>, loaded_at: DateTime<Utc>) -> Self {
        self.source_path = Some(path.into());
        self.loaded_at = Some(loaded_at);
        self
    }

    /// Major component of the version, if it parses.
    pub fn major_version(&self) -> Option<u64> {
        self.version.split('.').next()?.parse().ok()
    }

    /// Whether any expertise keyword equals one of `keywords`.
    ///
    /// `keywords` must already be lowercased.
    pub fn matches_keywords(&self, keywords: &HashSet<String>) -> bool {
        self.expertise_keywords
            .iter()
            .any(|k| keywords.contains(&k.trim().to_lowercase()))
    }

    pub fn summary(&self) -> DomainSummary {
        DomainSummary {
            domain_id: self.domain_id.clone(),
            domain_name: self.domain_name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            capabilities: self.capabilities.clone(),
            expertise_keywords: self.expertise_keywords.clone(),
        }
    }
}

/// `investments_research` -> `Investments Research`.
pub fn default_display_name(domain_id: &str) -> String {
    domain_id
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Listing view of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSummary {
    pub domain_id: String,
    pub domain_name: String,
    pub version: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub expertise_keywords: Vec<String>,
}

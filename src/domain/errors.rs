//! Domain errors for the domain model registry and context layer.
//!
//! Each layer has its own error enum; per-file problems during a load are
//! wrapped in [`LoadError`] and reported rather than propagated.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while turning raw document text into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Missing required heading: {0}")]
    MissingRequiredHeading(String),

    #[error("Front-matter block is missing its closing ---")]
    UnterminatedFrontMatter,

    #[error("Invalid front-matter: {0}")]
    InvalidFrontMatter(String),

    #[error("Invalid JSON document: {0}")]
    InvalidJson(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to render front-matter: {0}")]
    Render(String),
}

/// Category of a schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    /// A required field is absent or blank.
    Missing,
    /// A field does not match its grammar.
    InvalidFormat,
    /// A list field contains a blank item.
    EmptyItem,
    /// A list field repeats an item.
    DuplicateItem,
    /// Non-fatal disagreement between front-matter and body.
    Conflict,
    /// Non-fatal version compatibility concern.
    Compatibility,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::InvalidFormat => "invalid_format",
            Self::EmptyItem => "empty_item",
            Self::DuplicateItem => "duplicate_item",
            Self::Conflict => "conflict",
            Self::Compatibility => "compatibility",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: ValidationKind,
    pub field: String,
    pub detail: String,
}

impl ValidationIssue {
    pub fn new(kind: ValidationKind, field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.field, self.detail)
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Every schema violation found in one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} validation issue(s): {}", .issues.len(), format_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Whether any issue concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

/// Why a single file failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Duplicate domain_id '{domain_id}' (first loaded from {})", first_path.display())]
    DuplicateId { domain_id: String, first_path: PathBuf },

    #[error("Timed out after {0} ms")]
    Timeout(u64),
}

impl LoadError {
    /// Short machine-readable tag for reports and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Parse(_) => "parse",
            Self::Validation(_) => "validation",
            Self::DuplicateId { .. } => "duplicate_id",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Registry-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Domain models directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Domain model not found: {0}")]
    NotFound(String),

    #[error("IO error scanning {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Errors from a trace store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceStoreError {
    #[error("Request id already recorded: {0}")]
    DuplicateRequestId(String),

    #[error("Trace store IO error: {0}")]
    Io(String),

    #[error("Trace serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for TraceStoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TraceStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors surfaced to the orchestrator by the context layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("Query names neither domain ids nor keywords")]
    EmptyQuery,

    #[error("No domain model matched keywords: {}", .0.join(", "))]
    NoMatch(Vec<String>),

    #[error("Unknown domain ids: {}", .0.join(", "))]
    UnknownDomains(Vec<String>),

    #[error("Request id already recorded: {0}")]
    DuplicateRequestId(String),

    #[error("Trace not found: {0}")]
    TraceNotFound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    TraceStore(#[from] TraceStoreError),

    #[error("Resolution task failed: {0}")]
    Internal(String),
}

pub type ContextResult<T> = Result<T, ContextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_issue() {
        let err = ValidationError {
            issues: vec![
                ValidationIssue::new(ValidationKind::Missing, "description", "must not be empty"),
                ValidationIssue::new(ValidationKind::InvalidFormat, "version", "'1.0' is not semver"),
            ],
        };

        let message = err.to_string();
        assert!(message.starts_with("2 validation issue(s)"));
        assert!(message.contains("description"));
        assert!(message.contains("version"));
        assert!(err.has_field("version"));
        assert!(!err.has_field("tools"));
    }

    #[test]
    fn test_duplicate_id_names_first_file() {
        let err = LoadError::DuplicateId {
            domain_id: "investments".to_string(),
            first_path: PathBuf::from("/models/a.md"),
        };
        assert_eq!(err.kind(), "duplicate_id");
        assert!(err.to_string().contains("/models/a.md"));
    }

    #[test]
    fn test_registry_error_wraps_into_context_error() {
        let err: ContextError = RegistryError::NotFound("cognition".into()).into();
        assert_eq!(err.to_string(), "Domain model not found: cognition");
    }
}

//! Load reports: what a registry load produced and what it rejected.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::errors::{LoadError, ValidationIssue};

/// A file that could not be added to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: LoadError,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

impl Serialize for LoadFailure {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("LoadFailure", 3)?;
        s.serialize_field("path", &self.path)?;
        s.serialize_field("kind", self.error.kind())?;
        s.serialize_field("message", &self.error.to_string())?;
        s.end()
    }
}

/// A non-fatal finding on a file that did load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadWarning {
    pub path: PathBuf,
    pub domain_id: String,
    pub issue: ValidationIssue,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path.display(), self.domain_id, self.issue)
    }
}

/// Summary of one `load`/`reload`.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Ids that made it into the table, in discovery order.
    pub loaded: Vec<String>,
    pub failures: Vec<LoadFailure>,
    pub warnings: Vec<LoadWarning>,
    /// True when `preload` is off and the scan was deferred.
    pub deferred: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl LoadReport {
    pub fn deferred() -> Self {
        Self {
            loaded: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            deferred: true,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures of a given [`LoadError::kind`].
    pub fn failures_of_kind(&self, kind: &str) -> Vec<&LoadFailure> {
        self.failures
            .iter()
            .filter(|f| f.error.kind() == kind)
            .collect()
    }

    pub fn duplicate_count(&self) -> usize {
        self.failures_of_kind("duplicate_id").len()
    }
}

//! Schema validation for domain model descriptors.
//!
//! Validation collects every violation instead of stopping at the first, so
//! a load report can name all the problems in a file at once.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::errors::{ValidationError, ValidationIssue, ValidationKind};
use crate::domain::models::DomainModelDescriptor;
use crate::services::parser::ParsedDocument;

static DOMAIN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("domain id pattern is a valid regex"));

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    )
    .expect("semver pattern is a valid regex")
});

/// Whether `version` is a semantic version.
pub fn is_semver(version: &str) -> bool {
    SEMVER.is_match(version)
}

/// Whether `id` is a well-formed domain id.
pub fn is_valid_domain_id(id: &str) -> bool {
    DOMAIN_ID.is_match(id)
}

/// Non-fatal findings for a descriptor that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Validates descriptors, optionally against a framework version.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    framework_version: Option<String>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warn about descriptors whose major version is newer than `version`.
    pub fn with_framework_version(mut self, version: impl Into<String>) -> Self {
        self.framework_version = Some(version.into());
        self
    }

    /// Check a descriptor against the schema.
    ///
    /// # Errors
    /// Returns every violated rule when the descriptor is invalid.
    pub fn validate(
        &self,
        descriptor: &DomainModelDescriptor,
    ) -> Result<ValidationReport, ValidationError> {
        let issues = schema_issues(descriptor);
        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }

        let mut report = ValidationReport::default();
        if let Some(warning) = self.compatibility_warning(descriptor) {
            report.warnings.push(warning);
        }
        Ok(report)
    }

    /// Like [`Self::validate`], also surfacing the parser's field conflicts
    /// as warnings.
    ///
    /// # Errors
    /// Returns every violated rule when the descriptor is invalid.
    pub fn validate_document(
        &self,
        document: &ParsedDocument,
    ) -> Result<ValidationReport, ValidationError> {
        let mut report = self.validate(&document.descriptor)?;
        let conflicts = document.conflicts.iter().map(|c| {
            ValidationIssue::new(
                ValidationKind::Conflict,
                c.field,
                format!(
                    "front-matter '{}' differs from body '{}'; front-matter {}",
                    c.front_matter,
                    c.body,
                    if matches!(c.field, "description" | "version") {
                        "ignored"
                    } else {
                        "kept"
                    }
                ),
            )
        });
        report.warnings.splice(0..0, conflicts);
        Ok(report)
    }

    fn compatibility_warning(&self, descriptor: &DomainModelDescriptor) -> Option<ValidationIssue> {
        let framework = self.framework_version.as_deref()?;
        let framework_major: u64 = framework.split('.').next()?.parse().ok()?;
        let major = descriptor.major_version()?;
        (major > framework_major).then(|| {
            ValidationIssue::new(
                ValidationKind::Compatibility,
                "version",
                format!(
                    "major version {major} is newer than framework version {framework}"
                ),
            )
        })
    }
}

/// Validate with default settings.
///
/// # Errors
/// Returns every violated rule when the descriptor is invalid.
pub fn validate(descriptor: &DomainModelDescriptor) -> Result<ValidationReport, ValidationError> {
    SchemaValidator::default().validate(descriptor)
}

/// Validate a parsed document with default settings.
///
/// # Errors
/// Returns every violated rule when the descriptor is invalid.
pub fn validate_document(document: &ParsedDocument) -> Result<ValidationReport, ValidationError> {
    SchemaValidator::default().validate_document(document)
}

fn schema_issues(d: &DomainModelDescriptor) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let id = d.domain_id.trim();
    if id.is_empty() {
        issues.push(ValidationIssue::new(
            ValidationKind::Missing,
            "domain_id",
            "must not be empty",
        ));
    } else if !is_valid_domain_id(&d.domain_id) {
        issues.push(ValidationIssue::new(
            ValidationKind::InvalidFormat,
            "domain_id",
            format!("'{}' must match ^[a-z0-9_]+$", d.domain_id),
        ));
    }

    if d.description.trim().is_empty() {
        issues.push(ValidationIssue::new(
            ValidationKind::Missing,
            "description",
            "must not be empty",
        ));
    }

    if d.version.trim().is_empty() {
        issues.push(ValidationIssue::new(
            ValidationKind::Missing,
            "version",
            "must not be empty",
        ));
    } else if !is_semver(&d.version) {
        issues.push(ValidationIssue::new(
            ValidationKind::InvalidFormat,
            "version",
            format!("'{}' is not a semantic version (MAJOR.MINOR.PATCH)", d.version),
        ));
    }

    check_list("capabilities", &d.capabilities, false, &mut issues);
    check_list("tools", &d.tools, false, &mut issues);
    check_list("rule_sets", &d.rule_sets, false, &mut issues);
    check_list("expertise_keywords", &d.expertise_keywords, true, &mut issues);

    issues
}

fn check_list(
    field: &str,
    items: &[String],
    case_insensitive: bool,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            issues.push(ValidationIssue::new(
                ValidationKind::EmptyItem,
                field,
                format!("item {index} is empty"),
            ));
            continue;
        }

        let key = if case_insensitive {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        };
        if !seen.insert(key) {
            issues.push(ValidationIssue::new(
                ValidationKind::DuplicateItem,
                field,
                format!("'{trimmed}' appears more than once"),
            ));
        }
    }
}

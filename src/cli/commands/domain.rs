//! Domain model command handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::cli::output::{print_json, TableFormatter};
use crate::domain::errors::{LoadError, ValidationIssue};
use crate::domain::models::{LoadFailure, LoadWarning, RegistryConfig};
use crate::services::{parser, ContextService, DomainModelRegistry, SchemaValidator};

/// Handle `list`
pub async fn handle_list(service: &ContextService, json: bool) -> Result<()> {
    let domains = service
        .list_domains()
        .await
        .context("Failed to list domain models")?;

    if json {
        return print_json(&domains);
    }

    if domains.is_empty() {
        println!("No domain models loaded.");
        return Ok(());
    }

    println!("{}", TableFormatter::new().format_domains(&domains));
    println!(
        "\n{} domain model{}",
        domains.len(),
        if domains.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Handle `show <id>`
pub async fn handle_show(service: &ContextService, id: &str, json: bool) -> Result<()> {
    let descriptor = service
        .registry()
        .get(id)
        .await
        .with_context(|| format!("Failed to get domain model '{id}'"))?;

    if json {
        return print_json(descriptor.as_ref());
    }

    println!("{} ({})", descriptor.domain_name, descriptor.domain_id);
    println!("Version:      {}", descriptor.version);
    if let Some(ref path) = descriptor.source_path {
        println!("Source:       {}", path.display());
    }
    println!("Description:  {}", descriptor.description);
    print_list("Capabilities", &descriptor.capabilities);
    print_list("Tools", &descriptor.tools);
    print_list("Rule sets", &descriptor.rule_sets);
    print_list("Keywords", &descriptor.expertise_keywords);

    let versions = service.registry().versions(id).await;
    if versions.len() > 1 {
        println!("Seen versions: {}", versions.join(", "));
    }
    Ok(())
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{label}:");
    for item in items {
        println!("  - {item}");
    }
}

/// Result of a `validate` run.
#[derive(Debug, Serialize)]
pub struct ValidationSummary {
    pub checked: usize,
    pub valid: Vec<String>,
    pub failures: Vec<LoadFailure>,
    pub warnings: Vec<LoadWarning>,
}

/// Handle `validate [paths...]`
///
/// Fails when any checked document is rejected.
pub async fn handle_validate(config: &RegistryConfig, paths: &[PathBuf], json: bool) -> Result<()> {
    let summary = if paths.is_empty() {
        validate_directory(config).await?
    } else {
        validate_files(config, paths).await
    };

    if json {
        print_json(&summary)?;
    } else {
        let formatter = TableFormatter::new();
        println!(
            "Checked {} document{}: {} valid, {} rejected",
            summary.checked,
            if summary.checked == 1 { "" } else { "s" },
            summary.valid.len(),
            summary.failures.len()
        );
        if !summary.failures.is_empty() {
            println!("\nRejected:");
            println!("{}", formatter.format_failures(&summary.failures));
        }
        if !summary.warnings.is_empty() {
            println!("\nWarnings:");
            println!("{}", formatter.format_warnings(&summary.warnings));
        }
    }

    if !summary.failures.is_empty() {
        bail!("{} domain model(s) failed validation", summary.failures.len());
    }
    Ok(())
}

async fn validate_directory(config: &RegistryConfig) -> Result<ValidationSummary> {
    let registry = DomainModelRegistry::new(config.clone());
    let report = registry
        .reload()
        .await
        .context("Failed to scan domain models directory")?;

    Ok(ValidationSummary {
        checked: report.loaded.len() + report.failures.len(),
        valid: report.loaded,
        failures: report.failures,
        warnings: report.warnings,
    })
}

async fn validate_files(config: &RegistryConfig, paths: &[PathBuf]) -> ValidationSummary {
    let validator =
        SchemaValidator::new().with_framework_version(config.framework_version.clone());
    let mut summary = ValidationSummary {
        checked: paths.len(),
        valid: Vec::new(),
        failures: Vec::new(),
        warnings: Vec::new(),
    };

    for path in paths {
        match check_file(&validator, path).await {
            Ok((domain_id, warnings)) => {
                summary
                    .warnings
                    .extend(warnings.into_iter().map(|issue| LoadWarning {
                        path: path.clone(),
                        domain_id: domain_id.clone(),
                        issue,
                    }));
                summary.valid.push(domain_id);
            }
            Err(error) => summary.failures.push(LoadFailure {
                path: path.clone(),
                error,
            }),
        }
    }
    summary
}

async fn check_file(
    validator: &SchemaValidator,
    path: &Path,
) -> Result<(String, Vec<ValidationIssue>), LoadError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LoadError::Io(e.to_string()))?;
    let document = parser::parse_path(path, &raw)?;
    let report = validator.validate_document(&document)?;
    Ok((document.descriptor.domain_id, report.warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const VALID: &str = "# Domain\n\ninvestments\n\n## Description\n\nPortfolio analysis.\n\n## Version\n\n1.0.0\n";

    #[tokio::test]
    async fn test_validate_files_collects_failures() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("investments.md");
        let bad = temp.path().join("broken.md");
        let missing = temp.path().join("missing.md");
        fs::write(&good, VALID).unwrap();
        fs::write(
            &bad,
            "# Domain\n\nBad Id\n\n## Description\n\nd\n\n## Version\n\n1.0.0\n",
        )
        .unwrap();

        let config = RegistryConfig::new(temp.path());
        let summary = validate_files(&config, &[good, bad, missing]).await;

        assert_eq!(summary.checked, 3);
        assert_eq!(summary.valid, vec!["investments"]);
        let kinds: Vec<_> = summary.failures.iter().map(|f| f.error.kind()).collect();
        assert_eq!(kinds, vec!["validation", "io"]);
    }

    #[tokio::test]
    async fn test_validate_fails_on_rejected_document() {
        let temp = TempDir::new().unwrap();
        let bad = temp.path().join("broken.md");
        fs::write(&bad, "no headings here").unwrap();

        let config = RegistryConfig::new(temp.path());
        assert!(handle_validate(&config, &[bad], true).await.is_err());
    }

    #[tokio::test]
    async fn test_validate_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("investments.md"), VALID).unwrap();

        let config = RegistryConfig::new(temp.path()).with_preload(false);
        let summary = validate_directory(&config).await.unwrap();
        assert_eq!(summary.checked, 1);
        assert!(summary.failures.is_empty());
    }
}

//! Registry integration tests: loading the shipped examples, duplicate
//! handling and atomic reloads.

mod common;

use std::sync::Arc;

use mcp_context::domain::errors::{LoadError, RegistryError};
use mcp_context::domain::models::RegistryConfig;
use mcp_context::services::DomainModelRegistry;

use common::{document, fixture_dir, loaded_registry, temp_dir, write_file};

#[tokio::test]
async fn test_example_documents_load_in_lexical_order() {
    let registry = loaded_registry(&fixture_dir()).await;

    let report = registry.last_report().await.unwrap();
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failures);

    let ids: Vec<String> = registry
        .list()
        .await
        .unwrap()
        .iter()
        .map(|d| d.domain_id.clone())
        .collect();
    assert_eq!(ids, vec!["cognition", "investments", "legal_docs"]);
}

#[tokio::test]
async fn test_example_investments_fields() {
    let registry = loaded_registry(&fixture_dir()).await;
    let investments = registry.get("investments").await.unwrap();

    assert_eq!(investments.domain_name, "Investments");
    assert_eq!(investments.version, "1.2.0");
    assert!(investments.tools.contains(&"market_data".to_string()));
    assert!(investments
        .expertise_keywords
        .contains(&"finance".to_string()));
    assert!(investments
        .source_path
        .as_ref()
        .is_some_and(|p| p.ends_with("finance/investments.md")));
}

#[tokio::test]
async fn test_duplicate_ids_keep_first_loaded() {
    let temp = temp_dir();
    write_file(temp.path(), "a/investments.md", &document("investments", "1.0.0", &[]));
    write_file(temp.path(), "b/investments.md", &document("investments", "2.0.0", &[]));

    let registry = DomainModelRegistry::new(RegistryConfig::new(temp.path()));
    let report = registry.load().await.unwrap();

    assert_eq!(report.loaded, vec!["investments"]);
    assert_eq!(report.duplicate_count(), 1);
    let duplicates = report.failures_of_kind("duplicate_id");
    let failure = duplicates[0];
    assert!(failure.path.ends_with("b/investments.md"));
    assert!(matches!(
        &failure.error,
        LoadError::DuplicateId { first_path, .. } if first_path.ends_with("a/investments.md")
    ));

    assert_eq!(registry.get("investments").await.unwrap().version, "1.0.0");
}

#[tokio::test]
async fn test_bad_files_do_not_abort_load() {
    let temp = temp_dir();
    write_file(temp.path(), "good.md", &document("good", "1.0.0", &[]));
    write_file(temp.path(), "no_version.md", "# Domain\n\nbroken\n\n## Description\n\nd\n");
    write_file(temp.path(), "bad_version.md", &document("bad", "1.0", &[]));
    write_file(temp.path(), "garbage.json", "{ not json");

    let registry = DomainModelRegistry::new(RegistryConfig::new(temp.path()));
    let report = registry.load().await.unwrap();

    assert_eq!(report.loaded, vec!["good"]);
    assert_eq!(report.failures.len(), 3);
    assert_eq!(report.failures_of_kind("parse").len(), 2);
    assert_eq!(report.failures_of_kind("validation").len(), 1);

    let stats = registry.stats().await;
    assert_eq!(stats.parse_error_count, 2);
    assert_eq!(stats.validation_error_count, 1);
    assert_eq!(stats.size, 1);
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let temp = temp_dir();
    let registry = DomainModelRegistry::new(RegistryConfig::new(temp.path().join("absent")));

    assert!(matches!(
        registry.load().await,
        Err(RegistryError::DirectoryNotFound(_))
    ));
}

#[tokio::test]
async fn test_reload_picks_up_changes() {
    let temp = temp_dir();
    let path = write_file(temp.path(), "cognition.md", &document("cognition", "1.0.0", &[]));
    let registry = loaded_registry(temp.path()).await;

    std::fs::write(&path, document("cognition", "1.1.0", &[])).unwrap();
    write_file(temp.path(), "legal_docs.md", &document("legal_docs", "1.0.0", &[]));
    registry.reload().await.unwrap();

    assert_eq!(registry.get("cognition").await.unwrap().version, "1.1.0");
    assert!(registry.get("legal_docs").await.is_ok());
    assert_eq!(registry.versions("cognition").await, vec!["1.0.0", "1.1.0"]);
}

#[tokio::test]
async fn test_get_during_reload_sees_whole_tables() {
    let temp = temp_dir();
    let ids = ["alpha", "beta", "gamma", "delta"];
    for id in ids {
        write_file(temp.path(), &format!("{id}.md"), &document(id, "1.0.0", &[]));
    }
    let registry = loaded_registry(temp.path()).await;

    for id in ids {
        write_file(temp.path(), &format!("{id}.md"), &document(id, "2.0.0", &[]));
    }

    let mut readers = Vec::new();
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        readers.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..50 {
                let table = registry.snapshot().await.unwrap();
                let versions: Vec<&str> = ids
                    .iter()
                    .map(|id| table.get(id).unwrap().version.as_str())
                    .collect();
                assert!(
                    versions.iter().all(|v| *v == versions[0]),
                    "mixed table: {versions:?}"
                );
                seen.push(versions[0].to_string());

                let single = registry.get("beta").await.unwrap();
                assert_eq!(single.description, format!("beta at {}.", single.version));
                tokio::task::yield_now().await;
            }
            seen
        }));
    }

    registry.reload().await.unwrap();

    for reader in readers {
        for version in reader.await.unwrap() {
            assert!(version == "1.0.0" || version == "2.0.0");
        }
    }
    assert_eq!(registry.get("alpha").await.unwrap().version, "2.0.0");
}

#[tokio::test]
async fn test_lazy_registry_defers_scan() {
    let temp = temp_dir();
    let registry = DomainModelRegistry::new(RegistryConfig::new(temp.path()).with_preload(false));

    let report = registry.load().await.unwrap();
    assert!(report.deferred);
    assert!(!registry.is_loaded().await);

    write_file(temp.path(), "cognition.md", &document("cognition", "1.0.0", &[]));
    assert!(registry.get("cognition").await.is_ok());
    assert!(registry.is_loaded().await);
}

#[cfg(unix)]
#[tokio::test]
async fn test_slow_file_times_out_without_blocking_siblings() {
    use std::path::PathBuf;
    use std::process::Command;
    use std::time::Duration;

    let temp = temp_dir();
    write_file(temp.path(), "good.md", &document("good", "1.0.0", &[]));

    // reading a FIFO blocks until a writer opens it
    let fifo = temp.path().join("slow.md");
    let status = Command::new("mkfifo").arg(&fifo).status().unwrap();
    assert!(status.success());

    let config = RegistryConfig::new(temp.path())
        .with_files(vec![PathBuf::from("slow.md"), PathBuf::from("good.md")])
        .with_load_timeout(Duration::from_millis(50));
    let registry = DomainModelRegistry::new(config);
    let report = registry.load().await.unwrap();

    assert_eq!(report.loaded, vec!["good"]);
    let timeouts = report.failures_of_kind("timeout");
    assert_eq!(timeouts.len(), 1);
    assert!(timeouts[0].path.ends_with("slow.md"));
    assert!(matches!(timeouts[0].error, LoadError::Timeout(50)));
    assert_eq!(registry.get("good").await.unwrap().version, "1.0.0");

    // release the reader still parked on the blocking pool
    tokio::task::spawn_blocking(move || {
        std::fs::OpenOptions::new().write(true).open(&fifo).map(drop)
    })
    .await
    .unwrap()
    .unwrap();
}

//! Domain model registry.
//!
//! Discovers domain model documents under a directory, parses and validates
//! them concurrently, and serves the result as an immutable table keyed by
//! `domain_id`. Reloads build a fresh table off to the side and swap it in
//! whole, so readers always see one consistent generation.
//!
//! A table older than the configured TTL, or one marked stale through
//! [`DomainModelRegistry::invalidate`], is rebuilt by the next lookup.
//!
//! Per-file problems never abort a load: they are logged with
//! [`tracing::warn`] and collected into the [`LoadReport`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use walkdir::WalkDir;

use crate::domain::errors::{LoadError, RegistryError};
use crate::domain::models::{
    DocumentFormat, DomainModelDescriptor, LoadFailure, LoadReport, LoadWarning, RegistryConfig,
};
use crate::services::parser;
use crate::services::validator::{SchemaValidator, ValidationReport};

/// One generation of loaded descriptors, ordered by `domain_id`.
#[derive(Debug)]
pub struct RegistryTable {
    entries: BTreeMap<String, Arc<DomainModelDescriptor>>,
    built_at: Instant,
}

impl RegistryTable {
    /// Time since this generation was published.
    pub fn age(&self) -> Duration {
        self.built_at.elapsed()
    }

    pub fn contains(&self, domain_id: &str) -> bool {
        self.entries.contains_key(domain_id)
    }

    pub fn get(&self, domain_id: &str) -> Option<&Arc<DomainModelDescriptor>> {
        self.entries.get(domain_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptors in ascending `domain_id` order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<DomainModelDescriptor>> {
        self.entries.values()
    }
}

/// Snapshot of registry counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistryStats {
    /// Completed scans (eager, lazy or reload)
    pub load_count: u64,
    pub parse_error_count: u64,
    pub validation_error_count: u64,
    /// `get` calls that found a descriptor
    pub hits: u64,
    /// `get` calls for unknown ids
    pub misses: u64,
    /// Descriptors in the current table
    pub size: usize,
    /// `hits / (hits + misses)`, 0 when nothing was looked up
    pub hit_rate: f64,
    /// `invalidate` and `invalidate_all` calls
    pub invalidations: u64,
    /// Rescans triggered by an expired or invalidated table
    pub refreshes: u64,
    /// Whether a table has been built yet
    pub loaded: bool,
}

#[derive(Debug, Default)]
struct RegistryMetrics {
    load_count: AtomicU64,
    parse_error_count: AtomicU64,
    validation_error_count: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
    refreshes: AtomicU64,
}

type FileOutcome = Result<(DomainModelDescriptor, ValidationReport), LoadError>;

/// Registry of domain model descriptors.
///
/// Share it as `Arc<DomainModelRegistry>`; every method takes `&self`.
#[derive(Debug)]
pub struct DomainModelRegistry {
    config: RegistryConfig,
    validator: SchemaValidator,
    /// `None` until the first scan completes.
    table: RwLock<Option<Arc<RegistryTable>>>,
    /// Set by `invalidate`; cleared when a scan starts.
    stale: AtomicBool,
    /// Serializes load, reload and lazy scans.
    load_lock: Mutex<()>,
    last_report: RwLock<Option<LoadReport>>,
    history: RwLock<HashMap<String, Vec<String>>>,
    metrics: RegistryMetrics,
}

impl DomainModelRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        let validator =
            SchemaValidator::new().with_framework_version(config.framework_version.clone());
        Self {
            config,
            validator,
            table: RwLock::new(None),
            stale: AtomicBool::new(false),
            load_lock: Mutex::new(()),
            last_report: RwLock::new(None),
            history: RwLock::new(HashMap::new()),
            metrics: RegistryMetrics::default(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Initial load.
    ///
    /// With `preload` on, scans the directory now. Otherwise only checks the
    /// directory exists and defers the scan to the first lookup.
    ///
    /// # Errors
    /// Returns `DirectoryNotFound` if the domain models directory is missing.
    pub async fn load(&self) -> Result<LoadReport, RegistryError> {
        let _guard = self.load_lock.lock().await;
        self.check_directory()?;

        if !self.config.preload {
            tracing::info!(
                dir = %self.config.domain_models_dir.display(),
                "Preload disabled, deferring domain model scan to first lookup"
            );
            let report = LoadReport::deferred();
            *self.last_report.write().await = Some(report.clone());
            return Ok(report);
        }

        let (report, _) = self.scan_locked().await?;
        Ok(report)
    }

    /// Rescan the directory and swap in the new table.
    ///
    /// Readers holding the previous table keep using it; new lookups see the
    /// new one.
    ///
    /// # Errors
    /// Returns `DirectoryNotFound` if the directory has disappeared; the
    /// previous table stays in place.
    pub async fn reload(&self) -> Result<LoadReport, RegistryError> {
        let _guard = self.load_lock.lock().await;
        self.check_directory()?;
        let (report, _) = self.scan_locked().await?;
        Ok(report)
    }

    /// Look up a descriptor by id.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown ids, or the lazy scan's error.
    pub async fn get(&self, domain_id: &str) -> Result<Arc<DomainModelDescriptor>, RegistryError> {
        let table = self.snapshot().await?;
        if let Some(descriptor) = table.get(domain_id) {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            Ok(Arc::clone(descriptor))
        } else {
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            Err(RegistryError::NotFound(domain_id.to_string()))
        }
    }

    /// All descriptors, ascending by `domain_id`.
    ///
    /// # Errors
    /// Returns the lazy scan's error.
    pub async fn list(&self) -> Result<Vec<Arc<DomainModelDescriptor>>, RegistryError> {
        let table = self.snapshot().await?;
        Ok(table.descriptors().cloned().collect())
    }

    /// Current table, scanning first if loading was deferred or the table
    /// has expired or been invalidated.
    ///
    /// A refresh that cannot find the directory keeps serving the previous
    /// table.
    ///
    /// # Errors
    /// Returns `DirectoryNotFound` if a deferred scan finds no directory.
    pub async fn snapshot(&self) -> Result<Arc<RegistryTable>, RegistryError> {
        if let Some(table) = self.fresh_table().await {
            return Ok(table);
        }

        let _guard = self.load_lock.lock().await;
        let previous = match self.table.read().await.as_ref() {
            Some(table) if self.is_fresh(table) => return Ok(Arc::clone(table)),
            current => current.cloned(),
        };

        let Some(previous) = previous else {
            tracing::debug!("Running deferred domain model scan");
            self.check_directory()?;
            let (_, table) = self.scan_locked().await?;
            return Ok(table);
        };

        tracing::debug!(
            age_ms = u64::try_from(previous.age().as_millis()).unwrap_or(u64::MAX),
            "Refreshing expired domain model table"
        );
        if let Err(e) = self.check_directory() {
            tracing::warn!(error = %e, "Refresh skipped, serving previous domain model table");
            return Ok(previous);
        }
        self.metrics.refreshes.fetch_add(1, Ordering::Relaxed);
        let (_, table) = self.scan_locked().await?;
        Ok(table)
    }

    /// Mark the table stale so the next lookup rescans.
    ///
    /// Returns whether `domain_id` is in the current table.
    pub async fn invalidate(&self, domain_id: &str) -> bool {
        let cached = self
            .table
            .read()
            .await
            .as_ref()
            .is_some_and(|table| table.contains(domain_id));
        self.mark_stale();
        tracing::debug!(domain_id, cached, "Invalidated domain model");
        cached
    }

    /// Mark the whole table stale so the next lookup rescans.
    pub fn invalidate_all(&self) {
        self.mark_stale();
        tracing::debug!("Invalidated all domain models");
    }

    fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
        self.metrics.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    async fn fresh_table(&self) -> Option<Arc<RegistryTable>> {
        self.table
            .read()
            .await
            .as_ref()
            .filter(|table| self.is_fresh(table))
            .cloned()
    }

    fn is_fresh(&self, table: &RegistryTable) -> bool {
        !self.stale.load(Ordering::Acquire)
            && self.config.cache_ttl.is_none_or(|ttl| table.age() < ttl)
    }

    pub async fn is_loaded(&self) -> bool {
        self.table.read().await.is_some()
    }

    /// Report of the most recent load or reload.
    pub async fn last_report(&self) -> Option<LoadReport> {
        self.last_report.read().await.clone()
    }

    /// Every version seen for `domain_id` across loads, oldest semver first.
    pub async fn versions(&self, domain_id: &str) -> Vec<String> {
        self.history
            .read()
            .await
            .get(domain_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn stats(&self) -> RegistryStats {
        let table = self.table.read().await.clone();
        let hits = self.metrics.hits.load(Ordering::Relaxed);
        let misses = self.metrics.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };

        RegistryStats {
            load_count: self.metrics.load_count.load(Ordering::Relaxed),
            parse_error_count: self.metrics.parse_error_count.load(Ordering::Relaxed),
            validation_error_count: self.metrics.validation_error_count.load(Ordering::Relaxed),
            hits,
            misses,
            invalidations: self.metrics.invalidations.load(Ordering::Relaxed),
            refreshes: self.metrics.refreshes.load(Ordering::Relaxed),
            size: table.as_ref().map_or(0, |t| t.len()),
            hit_rate,
            loaded: table.is_some(),
        }
    }

    fn check_directory(&self) -> Result<(), RegistryError> {
        let dir = &self.config.domain_models_dir;
        if dir.is_dir() {
            Ok(())
        } else {
            Err(RegistryError::DirectoryNotFound(dir.clone()))
        }
    }

    /// Scan, build and publish a new table. Caller holds `load_lock`.
    async fn scan_locked(&self) -> Result<(LoadReport, Arc<RegistryTable>), RegistryError> {
        let started = Instant::now();
        let started_at = Utc::now();
        self.stale.store(false, Ordering::Release);
        let dir = self.config.domain_models_dir.clone();

        let paths = if self.config.files.is_empty() {
            let scan_dir = dir.clone();
            tokio::task::spawn_blocking(move || discover(&scan_dir))
                .await
                .map_err(|e| RegistryError::Io {
                    path: dir.clone(),
                    message: e.to_string(),
                })??
        } else {
            self.config.files.iter().map(|f| dir.join(f)).collect()
        };

        tracing::debug!(dir = %dir.display(), files = paths.len(), "Loading domain model files");

        let timeout = self.config.load_timeout;
        let outcomes = join_all(
            paths
                .iter()
                .map(|path| load_file(path.clone(), timeout, self.validator.clone())),
        )
        .await;

        let mut entries: BTreeMap<String, Arc<DomainModelDescriptor>> = BTreeMap::new();
        let mut report = LoadReport {
            loaded: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            deferred: false,
            started_at,
            duration_ms: 0,
        };

        for (path, outcome) in paths.into_iter().zip(outcomes) {
            let error = match outcome {
                Ok((descriptor, validation)) => {
                    if let Some(first) = entries.get(&descriptor.domain_id) {
                        LoadError::DuplicateId {
                            domain_id: descriptor.domain_id.clone(),
                            first_path: first.source_path.clone().unwrap_or_default(),
                        }
                    } else {
                        for issue in validation.warnings {
                            tracing::warn!(
                                path = %path.display(),
                                domain_id = %descriptor.domain_id,
                                issue = %issue,
                                "Domain model loaded with warning"
                            );
                            report.warnings.push(LoadWarning {
                                path: path.clone(),
                                domain_id: descriptor.domain_id.clone(),
                                issue,
                            });
                        }
                        report.loaded.push(descriptor.domain_id.clone());
                        let descriptor = descriptor.with_source(path, Utc::now());
                        entries.insert(descriptor.domain_id.clone(), Arc::new(descriptor));
                        continue;
                    }
                }
                Err(error) => error,
            };

            match error {
                LoadError::Parse(_) => {
                    self.metrics.parse_error_count.fetch_add(1, Ordering::Relaxed);
                }
                LoadError::Validation(_) => {
                    self.metrics
                        .validation_error_count
                        .fetch_add(1, Ordering::Relaxed);
                }
                _ => {}
            }
            tracing::warn!(
                path = %path.display(),
                kind = error.kind(),
                error = %error,
                "Skipping domain model that failed to load"
            );
            report.failures.push(LoadFailure { path, error });
        }

        let table = Arc::new(RegistryTable {
            entries,
            built_at: Instant::now(),
        });
        self.record_versions(&table).await;
        *self.table.write().await = Some(Arc::clone(&table));
        self.metrics.load_count.fetch_add(1, Ordering::Relaxed);

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            dir = %dir.display(),
            loaded = report.loaded.len(),
            failures = report.failures.len(),
            warnings = report.warnings.len(),
            duration_ms = report.duration_ms,
            "Domain model load complete"
        );
        *self.last_report.write().await = Some(report.clone());

        Ok((report, table))
    }

    async fn record_versions(&self, table: &RegistryTable) {
        let mut history = self.history.write().await;
        for descriptor in table.descriptors() {
            let versions = history.entry(descriptor.domain_id.clone()).or_default();
            if !versions.contains(&descriptor.version) {
                versions.push(descriptor.version.clone());
                versions.sort_by(|a, b| version_key(a).cmp(&version_key(b)).then_with(|| a.cmp(b)));
            }
        }
    }
}

/// Domain model files under `dir`, sorted by path.
fn discover(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let mut paths = Vec::new();
    let mut seen = HashSet::new();

    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(RegistryError::Io {
                    path: dir.to_path_buf(),
                    message: e.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read directory entry");
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || is_readme(path) {
            continue;
        }
        if DocumentFormat::from_path(path).is_some() && seen.insert(path.to_path_buf()) {
            paths.push(path.to_path_buf());
        }
    }

    paths.sort();
    Ok(paths)
}

fn is_readme(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case("readme.md"))
}

/// Read, parse and validate one file on the blocking pool under `timeout`.
async fn load_file(path: PathBuf, timeout: Duration, validator: SchemaValidator) -> FileOutcome {
    let task = tokio::task::spawn_blocking(move || read_and_parse(&path, &validator));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(LoadError::Io(format!("load task failed: {join_error}"))),
        Err(_) => Err(LoadError::Timeout(
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

fn read_and_parse(path: &Path, validator: &SchemaValidator) -> FileOutcome {
    let raw = std::fs::read_to_string(path).map_err(|e| LoadError::Io(e.to_string()))?;
    let document = parser::parse_path(path, &raw)?;
    let report = validator.validate_document(&document)?;
    Ok((document.descriptor, report))
}

/// Numeric ordering key for `MAJOR.MINOR.PATCH[-pre]`.
fn version_key(version: &str) -> (u64, u64, u64, bool) {
    let core = version.split('+').next().unwrap_or(version);
    let (core, pre) = match core.split_once('-') {
        Some((core, _)) => (core, true),
        None => (core, false),
    };
    let mut parts = core.split('.').map(|p| p.parse::<u64>().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        // releases sort after their pre-releases
        !pre,
    )
}

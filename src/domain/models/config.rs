use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Contents of the MCP configuration file (`.mcp/config.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct McpConfig {
    /// Config schema version
    #[serde(default = "default_config_version")]
    pub version: String,

    /// Framework version domain models are checked against
    #[serde(default = "default_framework_version")]
    pub framework_version: String,

    /// Domain model discovery settings
    #[serde(default)]
    pub domain_models: DomainModelsConfig,

    /// MCP servers known to the orchestrator
    #[serde(default)]
    pub servers: Vec<McpServerConfig>,

    /// Tool adapters referenced by domain models
    #[serde(default)]
    pub tools: Vec<ToolAdapterConfig>,

    /// Descriptor table expiry
    #[serde(default)]
    pub cache: CacheConfig,

    /// Trace log backend
    #[serde(default)]
    pub trace: TraceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_config_version() -> String {
    "1.0".to_string()
}

fn default_framework_version() -> String {
    "1.0.0".to_string()
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            framework_version: default_framework_version(),
            domain_models: DomainModelsConfig::default(),
            servers: vec![],
            tools: vec![],
            cache: CacheConfig::default(),
            trace: TraceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Domain model discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DomainModelsConfig {
    /// Directory to scan; relative paths are joined onto the repository root
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Explicit files to load (relative to `base_dir`); empty means scan
    #[serde(default)]
    pub files: Vec<PathBuf>,

    /// Load every descriptor at startup instead of on first lookup
    #[serde(default)]
    pub preload: bool,

    /// Per-file read/parse timeout in milliseconds
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
}

const fn default_load_timeout_ms() -> u64 {
    5_000
}

impl Default for DomainModelsConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            files: vec![],
            preload: false,
            load_timeout_ms: default_load_timeout_ms(),
        }
    }
}

/// Descriptor table expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Seconds a loaded table is served before the next lookup rescans;
    /// 0 keeps it until an explicit reload or invalidation
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
}

const fn default_ttl_seconds() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    /// The expiry as a duration, `None` when disabled.
    pub const fn ttl(&self) -> Option<Duration> {
        if self.default_ttl_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.default_ttl_seconds))
        }
    }
}

/// MCP server entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub id: String,
    pub name: String,
    /// e.g. http, grpc, local
    #[serde(rename = "type")]
    pub server_type: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Tool adapter entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolAdapterConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub tool_type: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub options: HashMap<String, serde_json::Value>,
}

const fn default_true() -> bool {
    true
}

/// Trace store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStoreKind {
    #[default]
    Memory,
    File,
}

/// Trace log configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TraceConfig {
    #[serde(default)]
    pub store: TraceStoreKind,

    /// JSONL file for the `file` store; relative paths are joined onto the
    /// directory holding the config file
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Fully resolved settings the registry runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Absolute directory scanned for domain model documents
    pub domain_models_dir: PathBuf,
    /// Absolute path of the main configuration file
    pub config_path: PathBuf,
    /// Eager (true) or lazy (false) loading
    pub preload: bool,
    /// Restrict loading to these files, relative to `domain_models_dir`
    pub files: Vec<PathBuf>,
    pub load_timeout: Duration,
    /// Age after which the table is rescanned on the next lookup
    pub cache_ttl: Option<Duration>,
    pub framework_version: String,
}

impl RegistryConfig {
    /// Settings for `dir` with eager loading and default limits.
    ///
    /// The config path defaults to a `config.json` next to `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let domain_models_dir = dir.into();
        let config_path = sibling_config_path(&domain_models_dir);
        Self {
            domain_models_dir,
            config_path,
            preload: true,
            files: Vec::new(),
            load_timeout: Duration::from_millis(default_load_timeout_ms()),
            cache_ttl: None,
            framework_version: default_framework_version(),
        }
    }

    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn with_framework_version(mut self, version: impl Into<String>) -> Self {
        self.framework_version = version.into();
        self
    }
}

/// `<parent of dir>/config.json`, matching the `.mcp/` layout.
pub fn sibling_config_path(dir: &Path) -> PathBuf {
    dir.parent()
        .map_or_else(|| dir.join("config.json"), |parent| parent.join("config.json"))
}

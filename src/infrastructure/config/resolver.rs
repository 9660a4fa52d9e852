//! Resolution of the registry's directory and config file.
//!
//! Paths are anchored on the repository root, found by walking up from the
//! running executable and the crate's manifest directory. The current
//! working directory is never consulted, so the same binary resolves the
//! same paths wherever it is launched from.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::loader::{ConfigError, ConfigLoader};
use crate::domain::models::config::sibling_config_path;
use crate::domain::models::{McpConfig, RegistryConfig};

/// Overrides the domain models directory
pub const ENV_DOMAIN_MODELS_DIR: &str = "MCP_DOMAIN_MODELS_DIR";
/// Overrides the config file path
pub const ENV_CONFIG_PATH: &str = "MCP_CONFIG_PATH";

/// Directories marking the repository root, in priority order.
pub const ROOT_MARKERS: [&str; 2] = [".mcp", ".git"];

const MCP_DIR: &str = ".mcp";
const DOMAIN_MODELS_DIR: &str = "domain-models";
const CONFIG_FILE: &str = "config.json";

/// Everything the lifecycle needs to build the registry and trace store.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub registry: RegistryConfig,
    pub mcp: McpConfig,
    pub repository_root: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Trace log path, relative entries anchored on the config file's directory.
    pub fn trace_path(&self) -> Option<PathBuf> {
        let path = self.mcp.trace.path.as_ref()?;
        if path.is_absolute() {
            return Some(path.clone());
        }
        let base = self.registry.config_path.parent().unwrap_or_else(|| Path::new(""));
        Some(base.join(path))
    }
}

/// Resolves configuration from explicit overrides, the environment and the
/// repository layout.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    anchors: Vec<PathBuf>,
    domain_models_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    read_env: bool,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    /// Resolver anchored on the executable and manifest directories, reading
    /// the `MCP_*` environment overrides.
    pub fn new() -> Self {
        Self {
            anchors: Self::default_anchors(),
            domain_models_dir: None,
            config_path: None,
            read_env: true,
        }
    }

    /// The running executable's directory, then the crate manifest directory.
    pub fn default_anchors() -> Vec<PathBuf> {
        let mut anchors = Vec::new();
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            anchors.push(dir);
        }
        anchors.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")));
        anchors
    }

    /// Replace the directories the root search starts from.
    pub fn with_anchors(mut self, anchors: Vec<PathBuf>) -> Self {
        self.anchors = anchors;
        self
    }

    /// Explicit directory override; wins over the environment.
    pub fn with_domain_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.domain_models_dir = Some(dir.into());
        self
    }

    /// Explicit config path override; wins over the environment.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Ignore `MCP_DOMAIN_MODELS_DIR` and `MCP_CONFIG_PATH`.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    /// First ancestor of an anchor holding `.mcp`, else one holding `.git`.
    pub fn find_root(&self) -> Option<PathBuf> {
        ROOT_MARKERS.iter().find_map(|marker| {
            self.anchors.iter().find_map(|anchor| {
                anchor
                    .ancestors()
                    .find(|dir| dir.join(marker).exists())
                    .map(Path::to_path_buf)
            })
        })
    }

    /// Resolve the registry settings and load the config file.
    ///
    /// # Errors
    /// - `RootNotFound` when a path cannot be anchored
    /// - `Invalid` and validation errors from the config file
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let root = self.find_root();
        let anchor = |path: PathBuf| -> Result<PathBuf, ConfigError> {
            if path.is_absolute() {
                return Ok(path);
            }
            root.as_ref()
                .map(|root| root.join(&path))
                .ok_or_else(|| self.root_not_found())
        };

        let dir_override = self
            .domain_models_dir
            .clone()
            .or_else(|| self.env_path(ENV_DOMAIN_MODELS_DIR))
            .map(&anchor)
            .transpose()?;
        let config_override = self
            .config_path
            .clone()
            .or_else(|| self.env_path(ENV_CONFIG_PATH))
            .map(&anchor)
            .transpose()?;

        let config_path = match (config_override, &root, &dir_override) {
            (Some(path), _, _) => path,
            (None, Some(root), _) => root.join(MCP_DIR).join(CONFIG_FILE),
            (None, None, Some(dir)) => sibling_config_path(dir),
            (None, None, None) => return Err(self.root_not_found()),
        };

        let mcp = ConfigLoader::load(&config_path)?;
        let config_dir = config_path
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);

        let domain_models_dir = match (dir_override, mcp.domain_models.base_dir.clone()) {
            (Some(dir), _) => dir,
            (None, Some(base)) if base.is_absolute() => base,
            (None, Some(base)) => root.as_ref().unwrap_or(&config_dir).join(base),
            (None, None) => root.as_ref().map_or_else(
                || config_dir.join(DOMAIN_MODELS_DIR),
                |root| root.join(MCP_DIR).join(DOMAIN_MODELS_DIR),
            ),
        };

        tracing::debug!(
            root = ?root,
            domain_models_dir = %domain_models_dir.display(),
            config_path = %config_path.display(),
            "Resolved configuration"
        );

        let registry = RegistryConfig::new(domain_models_dir)
            .with_config_path(config_path)
            .with_preload(mcp.domain_models.preload)
            .with_files(mcp.domain_models.files.clone())
            .with_load_timeout(Duration::from_millis(mcp.domain_models.load_timeout_ms))
            .with_cache_ttl(mcp.cache.ttl())
            .with_framework_version(mcp.framework_version.clone());

        Ok(ResolvedConfig {
            registry,
            mcp,
            repository_root: root,
        })
    }

    fn env_path(&self, key: &str) -> Option<PathBuf> {
        if !self.read_env {
            return None;
        }
        std::env::var_os(key)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    fn root_not_found(&self) -> ConfigError {
        ConfigError::RootNotFound(
            self.anchors
                .iter()
                .map(|a| a.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// `<temp>/repo/.mcp/{config.json,domain-models}` plus a nested anchor.
    fn repo() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("repo");
        fs::create_dir_all(root.join(".mcp/domain-models")).unwrap();
        let anchor = root.join("target/debug");
        fs::create_dir_all(&anchor).unwrap();
        (temp, root, anchor)
    }

    #[test]
    fn test_defaults_from_root() {
        let (_temp, root, anchor) = repo();
        let resolved = ConfigResolver::new()
            .without_env()
            .with_anchors(vec![anchor])
            .resolve()
            .unwrap();

        assert_eq!(resolved.repository_root.as_deref(), Some(root.as_path()));
        assert_eq!(resolved.registry.domain_models_dir, root.join(".mcp/domain-models"));
        assert_eq!(resolved.registry.config_path, root.join(".mcp/config.json"));
    }

    #[test]
    fn test_mcp_marker_beats_nearer_git() {
        let (_temp, root, anchor) = repo();
        fs::create_dir_all(root.join("target/.git")).unwrap();

        let resolver = ConfigResolver::new().without_env().with_anchors(vec![anchor]);
        assert_eq!(resolver.find_root(), Some(root));
    }

    #[test]
    fn test_base_dir_from_config_file() {
        let (_temp, root, anchor) = repo();
        fs::write(
            root.join(".mcp/config.json"),
            r#"{"domain_models": {"base_dir": "models", "preload": true}}"#,
        )
        .unwrap();

        let resolved = ConfigResolver::new()
            .without_env()
            .with_anchors(vec![anchor])
            .resolve()
            .unwrap();
        assert_eq!(resolved.registry.domain_models_dir, root.join("models"));
        assert!(resolved.registry.preload);
    }

    #[test]
    fn test_relative_override_joined_to_root() {
        let (_temp, root, anchor) = repo();
        let resolved = ConfigResolver::new()
            .without_env()
            .with_anchors(vec![anchor])
            .with_domain_models_dir("fixtures/models")
            .resolve()
            .unwrap();
        assert_eq!(resolved.registry.domain_models_dir, root.join("fixtures/models"));
    }

    #[test]
    fn test_absolute_dir_without_root_uses_sibling_config() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("elsewhere/domain-models");

        let resolved = ConfigResolver::new()
            .without_env()
            .with_anchors(vec![temp.path().join("no-markers")])
            .with_domain_models_dir(&dir)
            .resolve()
            .unwrap();

        assert_eq!(resolved.registry.domain_models_dir, dir);
        assert_eq!(
            resolved.registry.config_path,
            temp.path().join("elsewhere/config.json")
        );
        assert!(resolved.repository_root.is_none());
    }

    #[test]
    fn test_root_not_found() {
        let temp = TempDir::new().unwrap();
        let resolver = ConfigResolver::new()
            .without_env()
            .with_anchors(vec![temp.path().to_path_buf()]);

        assert!(matches!(resolver.resolve(), Err(ConfigError::RootNotFound(_))));

        let resolver = resolver.with_domain_models_dir("relative/dir");
        assert!(matches!(resolver.resolve(), Err(ConfigError::RootNotFound(_))));
    }

    #[test]
    fn test_trace_path_relative_to_config_dir() {
        let (_temp, root, anchor) = repo();
        fs::write(
            root.join(".mcp/config.json"),
            r#"{"trace": {"store": "file", "path": "traces.jsonl"}}"#,
        )
        .unwrap();

        let resolved = ConfigResolver::new()
            .without_env()
            .with_anchors(vec![anchor])
            .resolve()
            .unwrap();
        assert_eq!(resolved.trace_path(), Some(root.join(".mcp/traces.jsonl")));
    }
}

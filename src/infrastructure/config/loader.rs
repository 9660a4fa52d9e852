use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Json, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{McpConfig, TraceStoreKind};

/// Configuration error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Repository root not found: no .mcp or .git above {0}")]
    RootNotFound(String),

    #[error("Invalid configuration in {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Invalid load_timeout_ms: {0}. Must be positive")]
    InvalidLoadTimeout(u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Environment prefix for config overrides, e.g. `MCP_DOMAIN_MODELS__PRELOAD=true`
pub const ENV_PREFIX: &str = "MCP_";

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the MCP configuration file at `path`.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. The config file, JSON or YAML by extension (skipped if absent)
    /// 3. Environment variables (`MCP_` prefix, `__` for nesting)
    ///
    /// # Errors
    /// Returns `Invalid` for a malformed file and the validation errors of
    /// [`Self::validate`].
    pub fn load(path: &Path) -> Result<McpConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(McpConfig::default()));

        if path.is_file() {
            figment = if is_yaml(path) {
                figment.merge(Yaml::file(path))
            } else {
                figment.merge(Json::file(path))
            };
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
        }

        let config: McpConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Invalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    /// Returns the first violated rule.
    pub fn validate(config: &McpConfig) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.domain_models.load_timeout_ms == 0 {
            return Err(ConfigError::InvalidLoadTimeout(0));
        }

        if config.trace.store == TraceStoreKind::File && config.trace.path.is_none() {
            return Err(ConfigError::ValidationFailed(
                "trace.path is required when trace.store is 'file'".to_string(),
            ));
        }

        for server in &config.servers {
            if server.id.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "MCP server id cannot be empty".to_string(),
                ));
            }
        }

        for tool in &config.tools {
            if tool.name.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "Tool adapter name cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        ConfigLoader::validate(&McpConfig::default()).expect("Default config should be valid");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigLoader::load(&temp.path().join("config.json")).unwrap();
        assert_eq!(config.framework_version, "1.0.0");
        assert!(config.servers.is_empty());
    }

    #[test]
    fn test_json_and_yaml_files() {
        let temp = TempDir::new().unwrap();

        let json = temp.path().join("config.json");
        fs::write(&json, r#"{"domain_models": {"preload": true}, "logging": {"level": "debug"}}"#).unwrap();
        let yaml = temp.path().join("config.yaml");
        fs::write(&yaml, "domain_models:\n  load_timeout_ms: 250\n").unwrap();

        temp_env::with_vars_unset(["MCP_LOGGING__LEVEL", "MCP_DOMAIN_MODELS__PRELOAD"], || {
            let config = ConfigLoader::load(&json).unwrap();
            assert!(config.domain_models.preload);
            assert_eq!(config.logging.level, "debug");
            assert_eq!(config.logging.format, "pretty", "Default should persist when not overridden");

            let config = ConfigLoader::load(&yaml).unwrap();
            assert_eq!(config.domain_models.load_timeout_ms, 250);
        });
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ConfigLoader::load(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_env_override() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"logging": {"level": "info"}}"#).unwrap();

        temp_env::with_vars(
            [
                ("MCP_LOGGING__LEVEL", Some("warn")),
                ("MCP_DOMAIN_MODELS__PRELOAD", Some("true")),
            ],
            || {
                let config = ConfigLoader::load(&path).unwrap();
                assert_eq!(config.logging.level, "warn");
                assert!(config.domain_models.preload);
            },
        );
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = McpConfig::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = McpConfig::default();
        config.logging.format = "xml".to_string();
        assert_eq!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat("xml".to_string())
        );
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = McpConfig::default();
        config.domain_models.load_timeout_ms = 0;
        assert_eq!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLoadTimeout(0)
        );
    }

    #[test]
    fn test_validate_file_store_needs_path() {
        let mut config = McpConfig::default();
        config.trace.store = TraceStoreKind::File;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ValidationFailed(_))
        ));
    }
}

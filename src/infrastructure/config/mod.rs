//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - JSON or YAML config file loading
//! - Environment variable overrides
//! - Configuration validation
//! - Repository-root based path resolution

pub mod loader;
pub mod resolver;

pub use loader::{ConfigError, ConfigLoader};
pub use resolver::{ConfigResolver, ResolvedConfig, ENV_CONFIG_PATH, ENV_DOMAIN_MODELS_DIR};

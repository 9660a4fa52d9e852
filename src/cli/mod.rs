//! Command-line interface
//!
//! Clap types, command handlers and table output for `mcp-context`.

pub mod commands;
pub mod output;
pub mod types;

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::infrastructure::config::ConfigResolver;

pub use types::{Cli, Commands};

impl Cli {
    /// Config resolver carrying the `--domain-models-dir` and `--config`
    /// overrides.
    pub fn resolver(&self) -> ConfigResolver {
        let mut resolver = ConfigResolver::new();
        if let Some(ref dir) = self.domain_models_dir {
            resolver = resolver.with_domain_models_dir(absolute(dir));
        }
        if let Some(ref path) = self.config {
            resolver = resolver.with_config_path(absolute(path));
        }
        resolver
    }
}

/// Paths typed on the command line are relative to the shell, not the
/// repository root.
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}

/// Print an error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = json!({
            "error": err.to_string(),
            "causes": chain,
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| err.to_string())
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}

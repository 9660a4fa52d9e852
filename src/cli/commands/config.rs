//! Configuration command handler

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{print_json, TableFormatter};
use crate::domain::models::McpConfig;
use crate::infrastructure::config::ResolvedConfig;

#[derive(Debug, Serialize)]
struct ConfigView<'a> {
    repository_root: Option<&'a PathBuf>,
    domain_models_dir: &'a PathBuf,
    config_path: &'a PathBuf,
    config_file_exists: bool,
    preload: bool,
    load_timeout_ms: u128,
    cache_ttl_seconds: Option<u64>,
    trace_path: Option<PathBuf>,
    config: &'a McpConfig,
}

/// Handle `config`
pub fn handle_config(resolved: &ResolvedConfig, json: bool) -> Result<()> {
    let registry = &resolved.registry;
    let view = ConfigView {
        repository_root: resolved.repository_root.as_ref(),
        domain_models_dir: &registry.domain_models_dir,
        config_path: &registry.config_path,
        config_file_exists: registry.config_path.exists(),
        preload: registry.preload,
        load_timeout_ms: registry.load_timeout.as_millis(),
        cache_ttl_seconds: registry.cache_ttl.map(|ttl| ttl.as_secs()),
        trace_path: resolved.trace_path(),
        config: &resolved.mcp,
    };

    if json {
        return print_json(&view);
    }

    let root = view
        .repository_root
        .map_or_else(|| "-".to_string(), |p| p.display().to_string());
    println!("Repository root:    {root}");
    println!("Domain models dir:  {}", view.domain_models_dir.display());
    println!(
        "Config file:        {}{}",
        view.config_path.display(),
        if view.config_file_exists { "" } else { " (not found, using defaults)" }
    );
    println!("Preload:            {}", view.preload);
    println!("Load timeout:       {} ms", view.load_timeout_ms);
    match view.cache_ttl_seconds {
        Some(secs) => println!("Cache TTL:          {secs} s"),
        None => println!("Cache TTL:          none"),
    }
    println!("Framework version:  {}", resolved.mcp.framework_version);
    println!("Trace store:        {:?}", resolved.mcp.trace.store);
    if let Some(ref path) = view.trace_path {
        println!("Trace file:         {}", path.display());
    }
    println!(
        "Logging:            {} ({})",
        resolved.mcp.logging.level, resolved.mcp.logging.format
    );

    if !resolved.mcp.servers.is_empty() {
        println!("\nMCP servers:");
        println!(
            "{}",
            TableFormatter::new().format_mcp_servers(&resolved.mcp.servers)
        );
    }
    if !resolved.mcp.tools.is_empty() {
        println!("\nTool adapters:");
        for tool in &resolved.mcp.tools {
            println!(
                "  - {} ({}){}",
                tool.name,
                tool.tool_type,
                tool.endpoint
                    .as_deref()
                    .map(|e| format!(" at {e}"))
                    .unwrap_or_default()
            );
        }
    }
    Ok(())
}

//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mcp-context")]
#[command(about = "Domain model registry and context/trace layer for MCP orchestrators", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Domain models directory (overrides MCP_DOMAIN_MODELS_DIR)
    #[arg(long, global = true)]
    pub domain_models_dir: Option<PathBuf>,

    /// Config file path (overrides MCP_CONFIG_PATH)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List loaded domain models
    List,

    /// Show one domain model
    Show {
        /// Domain id
        id: String,
    },

    /// Validate domain model documents
    ///
    /// Without paths, loads the whole domain models directory and reports
    /// every file that fails.
    Validate {
        /// Individual files to check
        paths: Vec<PathBuf>,
    },

    /// Resolve a context query and print the bundle
    Resolve {
        /// Domain ids to consult (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        domains: Vec<String>,

        /// Expertise keywords to route by (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        keywords: Vec<String>,

        /// Request id to trace under (generated if omitted)
        #[arg(short, long)]
        request_id: Option<String>,
    },

    /// Show the most recent trace entries, newest first
    Traces {
        /// Maximum number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show the resolved configuration
    Config,

    /// Run the HTTP API
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "9200")]
        port: u16,

        /// Disable CORS headers
        #[arg(long)]
        no_cors: bool,
    },
}

//! mcp-context - Domain model registry and context layer for MCP orchestrators
//!
//! Loads domain model documents (markdown with optional YAML front-matter,
//! or JSON) from a `.mcp/domain-models` directory, validates them, and
//! serves them to orchestrators through a context layer that records a
//! trace entry for every resolution.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): Descriptor, trace and config models, errors, ports
//! - **Service Layer** (`services`): Parser, validator, registry and context layer
//! - **Infrastructure Layer** (`infrastructure`): Config resolution, logging, trace stores
//! - **Application Layer** (`application`): Service startup and shutdown
//! - **Adapters** (`adapters`): HTTP API
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use mcp_context::application;
//! use mcp_context::domain::models::ContextQuery;
//! use mcp_context::infrastructure::config::ConfigResolver;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = application::initialize(&ConfigResolver::new()).await?;
//!     let bundle = service.resolve(ContextQuery::for_keywords(["finance"])).await?;
//!     println!("{:?}", bundle.domain_ids());
//!     application::shutdown(&service).await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{initialize, shutdown, start, LifecycleError};
pub use domain::errors::{ContextError, LoadError, ParseError, RegistryError, ValidationError};
pub use domain::models::{
    ContextBundle, ContextQuery, DomainModelDescriptor, DomainSummary, LoadReport, McpConfig,
    RegistryConfig, TraceEntry, TraceOutcome,
};
pub use domain::ports::TraceStore;
pub use infrastructure::config::{ConfigError, ConfigLoader, ConfigResolver, ResolvedConfig};
pub use services::{ContextService, DomainModelRegistry, SchemaValidator};

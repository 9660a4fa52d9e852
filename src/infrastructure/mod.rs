//! Infrastructure layer module
//!
//! - Configuration loading and path resolution (figment)
//! - Logging infrastructure (tracing)
//! - Trace store implementations
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod logging;
pub mod trace_store;

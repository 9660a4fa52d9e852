//! Domain layer for the domain model registry
//!
//! This module contains the descriptor, trace and configuration models,
//! the error taxonomy, and the ports infrastructure must implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{
    ContextError, LoadError, ParseError, RegistryError, TraceStoreError, ValidationError,
    ValidationIssue, ValidationKind,
};

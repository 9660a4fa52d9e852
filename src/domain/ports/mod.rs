//! Port trait definitions (Hexagonal Architecture)
//!
//! - TraceStore: append-only audit log backing the context layer
//!
//! Infrastructure provides the implementations so the context layer stays
//! independent of where traces are kept.

pub mod trace_store;

pub use trace_store::TraceStore;

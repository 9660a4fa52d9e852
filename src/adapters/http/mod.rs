//! HTTP surface for the context service.
//!
//! Exposes the consumer API (list, resolve, trace lookup) plus health,
//! metrics, reload and server listing under `/api/mcp`.

pub mod router;

pub use router::{ErrorResponse, HttpConfig, McpHttpServer};

//! CLI command handlers
//!
//! Thin adapters over the context service; each takes the global `json`
//! flag and prints either pretty JSON or a table.

pub mod config;
pub mod domain;
pub mod resolve;
pub mod serve;
pub mod traces;

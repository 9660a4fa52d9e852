pub mod config;
pub mod context;
pub mod descriptor;
pub mod load_report;
pub mod trace;

pub use config::{
    DomainModelsConfig, LoggingConfig, McpConfig, McpServerConfig, RegistryConfig,
    ToolAdapterConfig, TraceConfig, TraceStoreKind,
};
pub use context::{ContextBundle, ContextQuery, DomainContext};
pub use descriptor::{DocumentFormat, DomainModelDescriptor, DomainSummary};
pub use load_report::{LoadFailure, LoadReport, LoadWarning};
pub use trace::{TraceEntry, TraceOutcome};

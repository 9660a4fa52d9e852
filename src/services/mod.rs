//! Service layer: parsing, validation, the registry and the context layer.

pub mod context_layer;
pub mod parser;
pub mod registry;
pub mod validator;

pub use context_layer::ContextService;
pub use parser::{FieldConflict, ParsedDocument};
pub use registry::{DomainModelRegistry, RegistryStats, RegistryTable};
pub use validator::{SchemaValidator, ValidationReport};

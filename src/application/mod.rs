pub mod lifecycle;

pub use lifecycle::{initialize, shutdown, start, LifecycleError};

pub mod analytics;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod session;
pub mod stats;
pub mod types;

pub use error::MonitorError;
pub use types::*;

/// Standard result type for all monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

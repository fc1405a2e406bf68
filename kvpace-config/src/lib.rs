//! Configuration for kvpace runs
//!
//! Settings are split by domain (target, workload, logging), each with its
//! own defaults and validation, and can be overridden through `KVPACE_*`
//! environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    logging::{LogFormat, LogLevel, LoggingConfig},
    target::{BackoffConfig, BackoffKind, TargetConfig},
    workload::WorkloadConfig,
    KvpaceConfig,
};

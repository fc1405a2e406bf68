//! Logging initialization for kvpace
//!
//! All crates emit through `tracing` or `log`; this crate installs the
//! global subscriber that renders them as text, compact, pretty or JSON.

pub mod init;

pub use init::{build_filter, init_logging_from_config, init_simple_tracing};

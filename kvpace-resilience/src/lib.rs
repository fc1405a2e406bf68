//! Resilience patterns for kvpace
//!
//! Backoff policies for redialing a target server, and the reconnect quorum
//! that decides when the target should be given up on.

pub mod backoff;
pub mod quorum;

// Re-export commonly used types
pub use backoff::{BackoffCalculator, BackoffStrategy};
pub use quorum::{QuorumMember, ReconnectQuorum};

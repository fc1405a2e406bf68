//! Rate-controlled load generation and reply checking for key-value servers
//!
//! An [`Engine`] spreads a target request rate over a set of workers. Each
//! worker pipelines a weighted mix of command batches on its own connection,
//! checks every reply in order, and accumulates statistics that are
//! summarized into a [`ResultSnapshot`] once per reporting interval.

pub mod connection;
pub mod engine;
pub mod error;
pub mod request;
pub mod scheduler;
pub mod stats;
pub mod worker;
pub mod workload;

pub use connection::ConnectionManager;
pub use engine::{Engine, RunHandle};
pub use error::{LoadError, ValidationError};
pub use request::{Check, CountSlot, OperationRequest};
pub use scheduler::RateScheduler;
pub use stats::{BucketStatus, ResultSnapshot, StatsAggregator, StatsBucket};
pub use worker::{Reader, Writer};
pub use workload::{Workload, WorkloadGenerator};

//! Key-value wire protocol transport for kvpace
//!
//! This crate provides the connection contract the load generator drives,
//! the RESP2 reply codec, and a TCP implementation. The `testing` feature adds
//! an in-memory server for tests in dependent crates.

pub mod codec;
pub mod command;
pub mod error;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use command::Command;
pub use error::WireError;
pub use redis::Value;
pub use transport::{Connection, Connector, SharedConnection, TcpConnection, TcpConnector};

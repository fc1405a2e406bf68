//! Wire error types

use std::time::Duration;
use thiserror::Error;

/// Wire error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    /// Dial failed
    #[error("Connect error: {0}")]
    ConnectError(String),

    /// Dial did not complete within the connect timeout
    #[error("Connect timeout after {0:?}")]
    ConnectTimeout(Duration),

    /// IO error on an established connection
    #[error("IO error: {0}")]
    IoError(String),

    /// Peer closed the connection, or it was closed locally
    #[error("Connection closed")]
    ConnectionClosed,

    /// Malformed frame received
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Server answered with an error reply
    #[error("Server error: {0}")]
    ServerError(String),
}

impl WireError {
    /// Whether this error happened while establishing a connection
    pub fn is_connect(&self) -> bool {
        matches!(
            self,
            WireError::ConnectError(_) | WireError::ConnectTimeout(_)
        )
    }

    /// Whether the connection that produced this error can no longer be used.
    /// Server error replies leave the stream in sync.
    pub fn breaks_connection(&self) -> bool {
        matches!(
            self,
            WireError::IoError(_) | WireError::ConnectionClosed | WireError::ProtocolError(_)
        )
    }
}

impl From<std::io::Error> for WireError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe => WireError::ConnectionClosed,
            _ => WireError::IoError(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for WireError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() {
            return if err.is_connection_dropped() {
                WireError::ConnectionClosed
            } else {
                WireError::IoError(err.to_string())
            };
        }
        match (err.kind(), err.code()) {
            (redis::ErrorKind::ParseError, _) | (_, None) => {
                WireError::ProtocolError(err.to_string())
            }
            (_, Some(code)) => match err.detail() {
                Some(detail) => WireError::ServerError(format!("{} {}", code, detail)),
                None => WireError::ServerError(code.to_string()),
            },
        }
    }
}

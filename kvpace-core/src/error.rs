//! Load generation error types

use kvpace_config::ConfigError;
use kvpace_wire::WireError;
use rand::distributions::WeightedError;
use thiserror::Error;

/// Errors that stop a run
#[derive(Error, Debug)]
pub enum LoadError {
    /// Every worker failed to connect at the same time
    #[error("target {address} unreachable, all {workers} workers failed to connect: {source}")]
    Unreachable {
        address: String,
        workers: usize,
        #[source]
        source: WireError,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid operation weights: {0}")]
    Weights(#[from] WeightedError),

    /// The engine's tasks are gone
    #[error("Engine stopped")]
    Stopped,
}

/// Why a reply did not match what the request expected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The request never got a reply
    #[error("{0}")]
    Transport(WireError),

    /// The server answered with an error reply
    #[error("server error: {0}")]
    Server(String),

    /// The reply has the wrong shape for the command
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("expect {expected}, get {actual}")]
    Mismatch { expected: String, actual: String },
}

impl ValidationError {
    pub fn mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        ValidationError::Mismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<WireError> for ValidationError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::ServerError(message) => ValidationError::Server(message),
            other => ValidationError::Transport(other),
        }
    }
}

//! Requests in flight and the checks their replies must pass

use kvpace_wire::{Command, SharedConnection, Value, WireError};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

use crate::error::ValidationError;

/// A count one request of a batch records and a later request checks against
#[derive(Debug, Clone, Default)]
pub struct CountSlot(Arc<AtomicI64>);

impl CountSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, count: i64) {
        self.0.store(count, Ordering::Release)
    }
}

/// What a reply must look like
#[derive(Debug, Clone)]
pub enum Check {
    /// Status `OK`
    Ok,
    /// Bulk string equal to what was written
    Bytes(Vec<u8>),
    /// Integer equal to the given value
    Int(i64),
    /// Integer 0 or 1
    ZeroOrOne,
    /// Integer greater than 0
    Positive,
    /// Any integer, remembered for a later check
    Record(CountSlot),
    /// Field/value pairs, as many as recorded
    Pairs(CountSlot),
    /// Members, as many as recorded
    Members(CountSlot),
}

impl Check {
    /// Judge a reply, or the transport error that replaced it
    pub fn validate(&self, reply: Result<Value, WireError>) -> Result<(), ValidationError> {
        let value = reply?;

        match self {
            Check::Ok => match value {
                Value::Okay => Ok(()),
                Value::Status(ref status) if status == "OK" => Ok(()),
                other => Err(ValidationError::mismatch("OK", describe(&other))),
            },
            Check::Bytes(expected) => match value {
                Value::Data(ref actual) if actual == expected => Ok(()),
                Value::Data(actual) => Err(ValidationError::mismatch(
                    String::from_utf8_lossy(expected),
                    String::from_utf8_lossy(&actual),
                )),
                other => Err(ValidationError::mismatch(
                    String::from_utf8_lossy(expected),
                    describe(&other),
                )),
            },
            Check::Int(expected) => {
                let actual = integer(&value)?;
                if actual == *expected {
                    Ok(())
                } else {
                    Err(ValidationError::mismatch(expected, actual))
                }
            }
            Check::ZeroOrOne => match integer(&value)? {
                0 | 1 => Ok(()),
                actual => Err(ValidationError::mismatch("0 or 1", actual)),
            },
            Check::Positive => match integer(&value)? {
                actual if actual > 0 => Ok(()),
                actual => Err(ValidationError::mismatch("larger than 0", actual)),
            },
            Check::Record(slot) => {
                slot.set(integer(&value)?);
                Ok(())
            }
            Check::Pairs(slot) => match value {
                Value::Bulk(items) if items.len() % 2 == 0 => {
                    expect_length(slot.get(), items.len() / 2)
                }
                other => Err(ValidationError::UnexpectedReply(format!(
                    "expect field/value pairs, get {}",
                    describe(&other)
                ))),
            },
            Check::Members(slot) => match value {
                Value::Bulk(items) => expect_length(slot.get(), items.len()),
                other => Err(ValidationError::UnexpectedReply(format!(
                    "expect members, get {}",
                    describe(&other)
                ))),
            },
        }
    }
}

fn integer(value: &Value) -> Result<i64, ValidationError> {
    redis::from_redis_value::<i64>(value)
        .map_err(|e| ValidationError::UnexpectedReply(e.to_string()))
}

fn expect_length(expected: i64, actual: usize) -> Result<(), ValidationError> {
    if expected == actual as i64 {
        Ok(())
    } else {
        Err(ValidationError::mismatch(
            format!("length {}", expected),
            actual,
        ))
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Data(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Bulk(items) => format!("array of {}", items.len()),
        Value::Status(status) => status.clone(),
        Value::Okay => "OK".to_string(),
    }
}

/// One command on its way through a worker.
///
/// Built by the workload, stamped and sent by the writer, then handed to the
/// reader which consumes its reply.
pub struct OperationRequest {
    command: Command,
    check: Check,
    sent_at: Option<Instant>,
    received_at: Option<Instant>,
    terminal: bool,
    connection: Option<SharedConnection>,
    transport_error: Option<WireError>,
}

impl OperationRequest {
    pub fn new(command: Command, check: Check) -> Self {
        Self {
            command,
            check,
            sent_at: None,
            received_at: None,
            terminal: false,
            connection: None,
            transport_error: None,
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn check(&self) -> &Check {
        &self.check
    }

    /// Whether the connection is closed once this reply is read
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub(crate) fn mark_terminal(&mut self) {
        self.terminal = true;
    }

    /// Queue and flush the command on `connection`, then stamp the send time.
    /// A transport failure is kept for the reader instead of a reply.
    pub(crate) async fn dispatch(&mut self, connection: &SharedConnection) {
        let result = match connection.send(&self.command).await {
            Ok(()) => connection.flush().await,
            Err(e) => Err(e),
        };
        self.sent_at = Some(Instant::now());
        self.connection = Some(Arc::clone(connection));
        self.transport_error = result.err();
    }

    /// Read this request's reply, validate it and stamp the receive time
    pub(crate) async fn complete(&mut self) -> Result<(), ValidationError> {
        let reply = match (self.transport_error.take(), &self.connection) {
            (Some(err), _) => Err(err),
            (None, Some(connection)) => connection.receive().await,
            (None, None) => Err(WireError::ConnectionClosed),
        };
        let outcome = self.check.validate(reply);
        self.received_at = Some(Instant::now());

        if self.terminal {
            if let Some(connection) = &self.connection {
                connection.close().await;
            }
        }
        outcome
    }

    /// Microseconds between send and receive
    pub fn elapsed_micros(&self) -> u64 {
        match (self.sent_at, self.received_at) {
            (Some(sent), Some(received)) => {
                received.saturating_duration_since(sent).as_micros() as u64
            }
            _ => 0,
        }
    }
}

impl fmt::Display for OperationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)
    }
}

impl fmt::Debug for OperationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRequest")
            .field("command", &self.command.to_string())
            .field("check", &self.check)
            .field("terminal", &self.terminal)
            .finish()
    }
}

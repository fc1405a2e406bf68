//! Connection contract and the TCP transport

use async_trait::async_trait;
use log::debug;
use redis::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::codec::ReplyReader;
use crate::command::Command;
use crate::error::WireError;

/// A connection shared between the task that writes to it and the task that
/// reads its replies
pub type SharedConnection = Arc<dyn Connection>;

/// One pipelined connection to the server.
///
/// The write side (`send`/`flush`) and the read side (`receive`) are used by
/// different tasks at the same time. Replies come back in the order commands
/// were flushed.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Queue a command without transmitting it
    async fn send(&self, command: &Command) -> Result<(), WireError>;

    /// Transmit everything queued so far
    async fn flush(&self) -> Result<(), WireError>;

    /// Wait for exactly one reply
    async fn receive(&self) -> Result<Value, WireError>;

    /// Close the connection. Later calls fail with `ConnectionClosed`.
    async fn close(&self);

    /// Whether the connection has failed or been closed
    fn is_broken(&self) -> bool;
}

/// Connection factory
#[async_trait]
pub trait Connector: Send + Sync {
    /// Dial `address`, giving up after `connect_timeout`
    async fn dial(
        &self,
        address: &str,
        connect_timeout: Duration,
    ) -> Result<SharedConnection, WireError>;
}

/// Dials plain TCP connections speaking RESP2
#[derive(Debug, Clone, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn dial(
        &self,
        address: &str,
        connect_timeout: Duration,
    ) -> Result<SharedConnection, WireError> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| WireError::ConnectTimeout(connect_timeout))?
            .map_err(|e| WireError::ConnectError(format!("{}: {}", address, e)))?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY on {}: {}", address, e);
        }

        Ok(Arc::new(TcpConnection::new(stream)))
    }
}

struct WriteSide {
    half: OwnedWriteHalf,
    pending: Vec<u8>,
}

/// RESP2 connection over a split TCP stream
pub struct TcpConnection {
    writer: Mutex<WriteSide>,
    reader: Mutex<ReplyReader<OwnedReadHalf>>,
    broken: AtomicBool,
}

impl TcpConnection {
    pub fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            writer: Mutex::new(WriteSide {
                half: write_half,
                pending: Vec::with_capacity(4096),
            }),
            reader: Mutex::new(ReplyReader::new(read_half)),
            broken: AtomicBool::new(false),
        }
    }

    fn check_usable(&self) -> Result<(), WireError> {
        if self.is_broken() {
            Err(WireError::ConnectionClosed)
        } else {
            Ok(())
        }
    }

    fn note_error(&self, err: &WireError) {
        if err.breaks_connection() {
            self.broken.store(true, Ordering::Release);
        }
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn send(&self, command: &Command) -> Result<(), WireError> {
        self.check_usable()?;
        let mut writer = self.writer.lock().await;
        command.pack_into(&mut writer.pending);
        Ok(())
    }

    async fn flush(&self) -> Result<(), WireError> {
        self.check_usable()?;
        let mut guard = self.writer.lock().await;
        let WriteSide { half, pending } = &mut *guard;
        if pending.is_empty() {
            return Ok(());
        }
        let result = half.write_all(pending).await;
        pending.clear();
        result.map_err(|e| {
            let err = WireError::from(e);
            self.note_error(&err);
            err
        })
    }

    async fn receive(&self) -> Result<Value, WireError> {
        let mut reader = self.reader.lock().await;
        reader.read_value().await.map_err(|err| {
            self.note_error(&err);
            err
        })
    }

    async fn close(&self) {
        self.broken.store(true, Ordering::Release);
        let mut writer = self.writer.lock().await;
        writer.pending.clear();
        if let Err(e) = writer.half.shutdown().await {
            debug!("Error shutting down connection: {}", e);
        }
    }

    fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }
}

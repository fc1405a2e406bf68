//! Worker: a writer that pipelines batches and a reader that checks replies
//!
//! The writer and reader of one worker run as separate tasks joined by a
//! bounded FIFO of in-flight requests. The reader takes replies in exactly
//! the order the writer flushed commands.

use kvpace_wire::SharedConnection;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::connection::ConnectionManager;
use crate::error::LoadError;
use crate::request::OperationRequest;
use crate::stats::StatsBucket;
use crate::workload::WorkloadGenerator;

/// Turns rate tokens into pipelined request batches
pub struct Writer {
    id: usize,
    tokens: mpsc::Receiver<u64>,
    requests: mpsc::Sender<OperationRequest>,
    workload: WorkloadGenerator,
    connections: ConnectionManager,
    reconnect_after: Option<u64>,
}

impl Writer {
    pub fn new(
        id: usize,
        tokens: mpsc::Receiver<u64>,
        requests: mpsc::Sender<OperationRequest>,
        workload: WorkloadGenerator,
        connections: ConnectionManager,
        reconnect_after: Option<u64>,
    ) -> Self {
        Self {
            id,
            tokens,
            requests,
            workload,
            connections,
            reconnect_after,
        }
    }

    /// Run until the token queue closes or the target becomes unreachable.
    ///
    /// Unspent tokens accumulate and a batch may overdraw them, so over time
    /// the number of requests sent tracks the number of tokens received.
    pub async fn run(mut self) -> Result<(), LoadError> {
        let mut integral: i64 = 0;
        let mut connection: Option<SharedConnection> = None;
        let mut remaining = self.reconnect_after.map(|n| n as i64);

        while let Some(tokens) = self.tokens.recv().await {
            integral += tokens as i64;

            while integral > 0 {
                let live = match connection.take() {
                    Some(conn) if !conn.is_broken() => conn,
                    _ => {
                        let conn = self.connections.acquire().await?;
                        remaining = self.reconnect_after.map(|n| n as i64);
                        conn
                    }
                };

                let mut batch = self.workload.next_batch();
                integral -= batch.len() as i64;
                for request in batch.iter_mut() {
                    request.dispatch(&live).await;
                }

                connection = Some(live);
                if let Some(left) = remaining.as_mut() {
                    *left -= batch.len() as i64;
                    if *left <= 0 {
                        if let Some(last) = batch.last_mut() {
                            last.mark_terminal();
                        }
                        trace!(worker = self.id, "reconnect budget spent");
                        connection = None;
                    }
                }

                for request in batch {
                    if self.requests.send(request).await.is_err() {
                        debug!(worker = self.id, "reader stopped, writer exiting");
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }
}

/// Consumes replies in order and folds outcomes into the worker's bucket
pub struct Reader {
    id: usize,
    requests: mpsc::Receiver<OperationRequest>,
    bucket: Arc<StatsBucket>,
}

impl Reader {
    pub fn new(id: usize, requests: mpsc::Receiver<OperationRequest>, bucket: Arc<StatsBucket>) -> Self {
        Self {
            id,
            requests,
            bucket,
        }
    }

    pub async fn run(mut self) {
        while let Some(mut request) = self.requests.recv().await {
            let outcome = request.complete().await;
            self.bucket
                .record(request.elapsed_micros(), outcome.is_err());

            if let Err(e) = outcome {
                debug!(worker = self.id, request = %request, "{}", e);
            }
        }
    }
}

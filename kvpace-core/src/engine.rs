//! Wiring a run together and owning its tasks

use kvpace_config::KvpaceConfig;
use kvpace_resilience::ReconnectQuorum;
use kvpace_wire::Connector;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::connection::ConnectionManager;
use crate::error::LoadError;
use crate::scheduler::RateScheduler;
use crate::stats::{ResultSnapshot, StatsAggregator, StatsBucket};
use crate::worker::{Reader, Writer};
use crate::workload::Workload;

/// A validated run configuration and the connector to run it with
pub struct Engine {
    config: KvpaceConfig,
    connector: Arc<dyn Connector>,
}

impl Engine {
    pub fn new(config: KvpaceConfig, connector: Arc<dyn Connector>) -> Result<Self, LoadError> {
        config.validate_all()?;
        Ok(Self { config, connector })
    }

    /// Spawn every worker, the rate scheduler and the aggregator.
    ///
    /// Must be called within a Tokio runtime. Nothing is sent until the
    /// first scheduler tick.
    pub fn start(self) -> Result<RunHandle, LoadError> {
        let target = &self.config.target;
        let workers = target.workers;
        let workload = Workload::new(self.config.workload.scaled(), workers)?;
        let quorum = ReconnectQuorum::new(workers);

        info!(
            address = %target.address,
            rate = target.rate,
            workers,
            reconnect_after = target.reconnect_after,
            "starting load"
        );
        if target.tokens_per_tick() == 0 {
            warn!(rate = target.rate, "rate rounds down to zero tokens per tick");
        }

        let mut tasks = JoinSet::new();
        let (fatal_tx, fatal_rx) = mpsc::channel(1);
        let mut token_senders = Vec::with_capacity(workers);
        let mut buckets = Vec::with_capacity(workers);

        for id in 0..workers {
            let (token_tx, token_rx) = mpsc::channel(target.token_queue_depth);
            let (request_tx, request_rx) = mpsc::channel(target.request_queue_depth);
            let bucket = StatsBucket::new();

            let writer = Writer::new(
                id,
                token_rx,
                request_tx,
                workload.for_worker(id),
                ConnectionManager::new(id, Arc::clone(&self.connector), target, &quorum),
                target.reconnect_budget(),
            );
            let reader = Reader::new(id, request_rx, Arc::clone(&bucket));

            let fatal = fatal_tx.clone();
            tasks.spawn(async move {
                if let Err(e) = writer.run().await {
                    // One report is enough; later ones are the same condition
                    let _ = fatal.try_send(e);
                }
            });
            tasks.spawn(reader.run());

            token_senders.push(token_tx);
            buckets.push(bucket);
        }
        drop(fatal_tx);

        let scheduler = RateScheduler::new(target.tokens_per_tick(), workers);
        tasks.spawn(scheduler.run(token_senders, target.tick_interval));

        let (result_tx, result_rx) = mpsc::channel(target.result_queue_depth);
        let aggregator = StatsAggregator::new(buckets, target.report_interval, target.rate);
        tasks.spawn(aggregator.run(result_tx));

        Ok(RunHandle {
            snapshots: result_rx,
            fatal: fatal_rx,
            _tasks: tasks,
        })
    }
}

/// A running load. Dropping it aborts every task of the run.
pub struct RunHandle {
    snapshots: mpsc::Receiver<ResultSnapshot>,
    fatal: mpsc::Receiver<LoadError>,
    _tasks: JoinSet<()>,
}

impl RunHandle {
    /// Wait for the next interval's snapshot, or the error that ended the run
    pub async fn next_snapshot(&mut self) -> Result<ResultSnapshot, LoadError> {
        tokio::select! {
            biased;
            Some(err) = self.fatal.recv() => Err(err),
            snapshot = self.snapshots.recv() => snapshot.ok_or(LoadError::Stopped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvpace_config::{TargetConfig, WorkloadConfig};
    use kvpace_wire::testing::{MemoryConnector, MemoryServer};
    use std::time::Duration;

    fn config(workers: usize, rate: u64) -> KvpaceConfig {
        KvpaceConfig {
            target: TargetConfig {
                workers,
                rate,
                ..TargetConfig::default()
            },
            workload: WorkloadConfig {
                key_num: 1000,
                hash_num: 100,
                set_num: 100,
                sorted_set_num: 100,
                value_len: 16,
                ..WorkloadConfig::default()
            },
            ..KvpaceConfig::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let connector = Arc::new(MemoryConnector::new(MemoryServer::new()));
        let result = Engine::new(config(200, 1000), connector);
        assert!(matches!(result, Err(LoadError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshots_every_second() {
        let connector = Arc::new(MemoryConnector::new(MemoryServer::new()));
        let mut run = Engine::new(config(4, 2000), connector)
            .unwrap()
            .start()
            .unwrap();

        let started = tokio::time::Instant::now();
        let first = run.next_snapshot().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(first.expected, 2000);
        assert_eq!(first.errors, 0);
        assert!(first.ops >= 1900 && first.ops <= 2100, "ops {}", first.ops);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_target_ends_run() {
        let connector = Arc::new(MemoryConnector::unreachable());
        let mut run = Engine::new(config(3, 1000), connector)
            .unwrap()
            .start()
            .unwrap();

        let err = run.next_snapshot().await.unwrap_err();
        assert!(matches!(err, LoadError::Unreachable { workers: 3, .. }));
    }
}

//! Dialing with backoff and quorum fail-fast

use kvpace_config::{BackoffConfig, BackoffKind, TargetConfig};
use kvpace_resilience::{BackoffCalculator, BackoffStrategy, QuorumMember, ReconnectQuorum};
use kvpace_wire::{Connector, SharedConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::LoadError;

/// Build the redial delay policy from configuration
pub fn backoff_from_config(config: &BackoffConfig) -> BackoffCalculator {
    let strategy = match config.strategy {
        BackoffKind::Fixed => BackoffStrategy::Fixed,
        BackoffKind::Linear => BackoffStrategy::Linear,
        BackoffKind::Exponential => BackoffStrategy::Exponential { base: config.base },
    };
    BackoffCalculator::new(
        strategy,
        config.initial_delay,
        config.max_delay,
        config.jitter,
    )
}

/// One worker's way to a live connection
pub struct ConnectionManager {
    worker: usize,
    connector: Arc<dyn Connector>,
    address: Arc<str>,
    connect_timeout: Duration,
    backoff: BackoffCalculator,
    quorum: QuorumMember,
}

impl ConnectionManager {
    pub fn new(
        worker: usize,
        connector: Arc<dyn Connector>,
        target: &TargetConfig,
        quorum: &Arc<ReconnectQuorum>,
    ) -> Self {
        Self {
            worker,
            connector,
            address: Arc::from(target.address.as_str()),
            connect_timeout: target.connect_timeout,
            backoff: backoff_from_config(&target.reconnect_backoff),
            quorum: quorum.member(),
        }
    }

    /// Dial until a connection is established.
    ///
    /// Failures are retried after the backoff delay for as long as at least
    /// one worker in the run can still connect. Once every worker is failing
    /// at the same time the target is reported unreachable.
    pub async fn acquire(&mut self) -> Result<SharedConnection, LoadError> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match self.connector.dial(&self.address, self.connect_timeout).await {
                Ok(connection) => {
                    if self.quorum.is_failing() {
                        debug!(worker = self.worker, attempt, "reconnected");
                    }
                    self.quorum.record_success();
                    return Ok(connection);
                }
                Err(e) => {
                    if self.quorum.record_failure() {
                        error!(worker = self.worker, "{}", e);
                        return Err(LoadError::Unreachable {
                            address: self.address.to_string(),
                            workers: self.quorum.total(),
                            source: e,
                        });
                    }
                    let delay = self.backoff.calculate_delay(attempt);
                    debug!(worker = self.worker, attempt, ?delay, "dial failed: {}", e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

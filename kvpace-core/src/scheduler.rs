//! Spreading the target rate across workers, one tick at a time

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Per-tick token allocation with a rotating remainder
#[derive(Debug, Clone)]
pub struct RateScheduler {
    tokens_per_tick: u64,
    offset: usize,
    shares: Vec<u64>,
}

impl RateScheduler {
    pub fn new(tokens_per_tick: u64, workers: usize) -> Self {
        Self {
            tokens_per_tick,
            offset: 0,
            shares: vec![0; workers.max(1)],
        }
    }

    pub fn tokens_per_tick(&self) -> u64 {
        self.tokens_per_tick
    }

    /// Shares for the next tick, indexed by worker.
    ///
    /// Everyone gets `tokens / workers`; the `tokens % workers` workers
    /// starting at the rotating offset get one more, and the offset moves past
    /// them so the extra tokens go around evenly.
    pub fn allocate(&mut self) -> &[u64] {
        let workers = self.shares.len();
        let base = self.tokens_per_tick / workers as u64;
        let extra = (self.tokens_per_tick % workers as u64) as usize;

        self.shares.fill(base);
        for i in 0..extra {
            self.shares[(self.offset + i) % workers] += 1;
        }
        self.offset = (self.offset + extra) % workers;

        &self.shares
    }

    /// Deliver tokens every `tick` until every worker queue is closed.
    /// Sends block while a worker's queue is full.
    pub async fn run(mut self, workers: Vec<mpsc::Sender<u64>>, tick: Duration) {
        let mut ticker = interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let mut delivered = false;
            let shares = self.allocate();
            for (index, share) in shares.iter().enumerate() {
                if *share == 0 {
                    continue;
                }
                if workers[index].send(*share).await.is_ok() {
                    delivered = true;
                }
            }
            trace!(tokens = self.tokens_per_tick, "tick");

            if !delivered && workers.iter().all(|w| w.is_closed()) {
                debug!("all workers stopped, rate scheduler exiting");
                return;
            }
        }
    }
}

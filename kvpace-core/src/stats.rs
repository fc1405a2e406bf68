//! Per-worker statistics and their periodic aggregation

use crossbeam_utils::CachePadded;
use portable_atomic::{AtomicU128, Ordering};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Totals accumulated by one worker since the last drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketStatus {
    pub count: u64,
    pub latency_us: u64,
    pub errors: u64,
}

// Packed layout: count in bits 0..32, errors in 32..64, latency in 64..128
const COUNT_BITS: u32 = 32;
const LATENCY_SHIFT: u32 = 64;
const FIELD_MASK: u128 = (1 << COUNT_BITS) - 1;

impl BucketStatus {
    fn unpack(packed: u128) -> Self {
        BucketStatus {
            count: (packed & FIELD_MASK) as u64,
            errors: ((packed >> COUNT_BITS) & FIELD_MASK) as u64,
            latency_us: (packed >> LATENCY_SHIFT) as u64,
        }
    }
}

/// One completed request as a packed increment
fn request_delta(latency_us: u64, failed: bool) -> u128 {
    1 | (u128::from(failed) << COUNT_BITS) | (u128::from(latency_us) << LATENCY_SHIFT)
}

/// A worker's [`BucketStatus`], packed into a single 128-bit word.
///
/// The reader adds each completed request with one `fetch_add`; the
/// aggregator swaps the word for zero. Both are single lock-free atomic
/// operations, so a drain sees every request either entirely or not at all.
/// Count and errors hold 32 bits per drain period and do not carry into
/// each other below that.
#[derive(Debug, Default)]
pub struct StatsBucket {
    status: CachePadded<AtomicU128>,
}

impl StatsBucket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Account for one completed request
    pub fn record(&self, latency_us: u64, failed: bool) {
        self.status
            .fetch_add(request_delta(latency_us, failed), Ordering::AcqRel);
    }

    /// Take everything recorded so far, leaving the bucket empty
    pub fn drain(&self) -> BucketStatus {
        BucketStatus::unpack(self.status.swap(0, Ordering::AcqRel))
    }
}

/// One reporting interval's summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultSnapshot {
    /// Configured aggregate rate
    pub expected: u64,
    /// Operations completed during the interval
    pub ops: u64,
    /// Mean latency in microseconds, 0 when nothing completed
    pub mean_latency_us: u64,
    pub errors: u64,
}

impl ResultSnapshot {
    pub fn summarize(statuses: &[BucketStatus], expected: u64) -> Self {
        let (ops, latency, errors) = statuses.iter().fold((0u64, 0u64, 0u64), |acc, s| {
            (acc.0 + s.count, acc.1 + s.latency_us, acc.2 + s.errors)
        });

        ResultSnapshot {
            expected,
            ops,
            mean_latency_us: if ops > 0 { latency / ops } else { 0 },
            errors,
        }
    }
}

/// Drains every bucket once per period and publishes the summary
pub struct StatsAggregator {
    buckets: Vec<Arc<StatsBucket>>,
    period: Duration,
    expected: u64,
}

impl StatsAggregator {
    pub fn new(buckets: Vec<Arc<StatsBucket>>, period: Duration, expected: u64) -> Self {
        Self {
            buckets,
            period,
            expected,
        }
    }

    /// Collect and summarize all buckets right now
    pub fn collect(&self) -> ResultSnapshot {
        let statuses: Vec<BucketStatus> = self.buckets.iter().map(|b| b.drain()).collect();
        ResultSnapshot::summarize(&statuses, self.expected)
    }

    /// Publish a snapshot every period until the receiver goes away
    pub async fn run(self, results: mpsc::Sender<ResultSnapshot>) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let snapshot = self.collect();
            if results.send(snapshot).await.is_err() {
                debug!("result receiver dropped, stopping aggregation");
                return;
            }
        }
    }
}

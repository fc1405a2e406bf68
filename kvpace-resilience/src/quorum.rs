//! Reconnect quorum: detect when every worker has lost the server at once
//!
//! Each worker holds a [`QuorumMember`]. A member counts itself as failing
//! on the first failed dial of a streak and stops counting on the next
//! success. When the number of failing members reaches the total the target
//! is considered unreachable.

use log::{debug, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared count of workers currently unable to connect
#[derive(Debug)]
pub struct ReconnectQuorum {
    failing: AtomicUsize,
    total: usize,
}

impl ReconnectQuorum {
    pub fn new(total: usize) -> Arc<Self> {
        Arc::new(Self {
            failing: AtomicUsize::new(0),
            total,
        })
    }

    /// Workers currently in a failure streak
    pub fn failing(&self) -> usize {
        self.failing.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// All workers are failing at the same time
    pub fn is_lost(&self) -> bool {
        self.failing() >= self.total
    }

    /// Register a worker that reports into this quorum
    pub fn member(self: &Arc<Self>) -> QuorumMember {
        QuorumMember {
            quorum: Arc::clone(self),
            counted: false,
        }
    }
}

/// One worker's view of the quorum
#[derive(Debug)]
pub struct QuorumMember {
    quorum: Arc<ReconnectQuorum>,
    counted: bool,
}

impl QuorumMember {
    /// Record a failed dial. Returns `true` when the quorum is lost.
    pub fn record_failure(&mut self) -> bool {
        if !self.counted {
            self.counted = true;
            let failing = self.quorum.failing.fetch_add(1, Ordering::AcqRel) + 1;
            debug!("{}/{} workers failing to connect", failing, self.quorum.total);
        }

        let lost = self.quorum.is_lost();
        if lost {
            warn!(
                "all {} workers failed to connect, target unreachable",
                self.quorum.total
            );
        }
        lost
    }

    /// Record a successful dial, ending any failure streak
    pub fn record_success(&mut self) {
        if self.counted {
            self.counted = false;
            self.quorum.failing.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Whether this member is currently counted as failing
    pub fn is_failing(&self) -> bool {
        self.counted
    }

    /// Size of the quorum this member belongs to
    pub fn total(&self) -> usize {
        self.quorum.total
    }
}

impl Drop for QuorumMember {
    fn drop(&mut self) {
        self.record_success();
    }
}

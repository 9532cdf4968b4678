//! In-flight request tracking.
//!
//! # Responsibilities
//! - Count requests currently being served
//! - Generate unique request sequence IDs for tracing
//! - Let a drain wait until nothing is in flight

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::observability::metrics;

/// Global atomic counter for request sequence IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static REQUEST_SEQ_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique sequence number of a tracked request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestSeq(u64);

impl RequestSeq {
    pub fn next() -> Self {
        Self(REQUEST_SEQ_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Tracks in-flight requests.
///
/// The count lives in a watch channel so a drain can wait for it to reach
/// zero without polling.
#[derive(Debug, Clone)]
pub struct InFlightTracker {
    count: Arc<watch::Sender<u64>>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            count: Arc::new(tx),
        }
    }

    /// Record a new request. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        self.count.send_modify(|n| *n += 1);
        metrics::record_in_flight(*self.count.borrow());
        InFlightGuard {
            count: Arc::clone(&self.count),
            seq: RequestSeq::next(),
        }
    }

    /// Current number of in-flight requests.
    pub fn active_count(&self) -> u64 {
        *self.count.borrow()
    }

    /// Wait until no request is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for InFlightTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks a request's lifetime.
/// Decrements the in-flight count when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    count: Arc<watch::Sender<u64>>,
    seq: RequestSeq,
}

impl InFlightGuard {
    pub fn seq(&self) -> RequestSeq {
        self.seq
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
        metrics::record_in_flight(*self.count.borrow());
        tracing::trace!(request_seq = %self.seq, "Request finished");
    }
}

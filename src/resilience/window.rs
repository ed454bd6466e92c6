//! Bucketed rolling window of call outcomes.
//!
//! The window spans `span` and is split into `buckets` equal slices. A bucket
//! is dropped once its whole slice has left the window, so the failure ratio
//! only ever reflects outcomes recorded within roughly the last `span`.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    start: Instant,
    successes: u64,
    failures: u64,
}

/// Success/failure counts over a sliding time span.
///
/// Not synchronized; the owning breaker guards it with its decision lock.
#[derive(Debug)]
pub struct RollingWindow {
    span: Duration,
    bucket_span: Duration,
    buckets: VecDeque<Bucket>,
}

/// Aggregate counts for the live part of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowTotals {
    pub successes: u64,
    pub failures: u64,
}

impl WindowTotals {
    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }

    /// Failure ratio, 0.0 for an empty window.
    pub fn failure_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.failures as f64 / total as f64,
        }
    }
}

impl RollingWindow {
    pub fn new(span: Duration, buckets: u32) -> Self {
        let buckets = buckets.max(1);
        let bucket_span = (span / buckets).max(Duration::from_millis(1));
        Self {
            span,
            bucket_span,
            buckets: VecDeque::with_capacity(buckets as usize + 1),
        }
    }

    pub fn record_success(&mut self, now: Instant) {
        self.current_bucket(now).successes += 1;
    }

    pub fn record_failure(&mut self, now: Instant) {
        self.current_bucket(now).failures += 1;
    }

    /// Totals over buckets still inside the window at `now`.
    pub fn totals(&mut self, now: Instant) -> WindowTotals {
        self.evict(now);
        self.buckets.iter().fold(WindowTotals::default(), |acc, b| WindowTotals {
            successes: acc.successes + b.successes,
            failures: acc.failures + b.failures,
        })
    }

    /// Start of the oldest live bucket, if any outcome is in the window.
    pub fn oldest_start(&mut self, now: Instant) -> Option<Instant> {
        self.evict(now);
        self.buckets.front().map(|b| b.start)
    }

    pub fn reset(&mut self) {
        self.buckets.clear();
    }

    fn current_bucket(&mut self, now: Instant) -> &mut Bucket {
        self.evict(now);
        let needs_new = match self.buckets.back() {
            Some(last) => now.saturating_duration_since(last.start) >= self.bucket_span,
            None => true,
        };
        if needs_new {
            self.buckets.push_back(Bucket {
                start: now,
                successes: 0,
                failures: 0,
            });
        }
        // Just pushed or checked non-empty above.
        let last = self.buckets.len() - 1;
        &mut self.buckets[last]
    }

    fn evict(&mut self, now: Instant) {
        while let Some(front) = self.buckets.front() {
            if now.saturating_duration_since(front.start) >= self.span {
                self.buckets.pop_front();
            } else {
                break;
            }
        }
    }
}

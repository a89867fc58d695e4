//! Transport counters and the metrics sink interface
//!
//! Counters are plain atomics updated on the hot path. Anything that should
//! reach an external metrics system goes through [`MetricsSink`], whose methods
//! all default to no-ops so an unconfigured sink costs nothing.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Reason a record never reached the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LostCategory {
    /// Sink unreachable or the connection broke mid-write
    Connection,
    /// In-flight byte ceiling reached
    Memory,
    /// Queue depth ceiling reached
    Capacity,
    Unknown,
}

impl LostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LostCategory::Connection => "connection",
            LostCategory::Memory => "memory",
            LostCategory::Capacity => "capacity",
            LostCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver for transport metrics
///
/// Implement the methods you care about; the rest stay no-ops.
///
/// # Example
///
/// ```
/// use rust_log_transport::{LostCategory, MetricsSink};
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// #[derive(Default)]
/// struct LostCounter(AtomicU64);
///
/// impl MetricsSink for LostCounter {
///     fn lost_message(&self, _category: LostCategory) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait MetricsSink: Send + Sync {
    /// Queue depth gauge change
    fn buffer_messages(&self, _delta: i64) {}

    /// In-flight byte gauge change
    fn buffer_bytes(&self, _delta: i64) {}

    /// Size of one rendered record
    fn message_size(&self, _bytes: usize) {}

    /// One record dropped
    fn lost_message(&self, _category: LostCategory) {}

    /// Duration of one writer call
    fn write_latency(&self, _elapsed: Duration) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {}

/// Delivery counters of one transport
#[derive(Debug)]
pub struct TransportMetrics {
    /// Records handed to the writer successfully
    sent: AtomicU64,

    /// Records dropped at enqueue time or after a failed write
    lost: AtomicU64,
}

impl TransportMetrics {
    pub const fn new() -> Self {
        Self {
            sent: AtomicU64::new(0),
            lost: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn lost(&self) -> u64 {
        self.lost.load(Ordering::Relaxed)
    }

    /// Record a delivered message, returning the previous count
    #[inline]
    pub fn record_sent(&self) -> u64 {
        self.sent.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a lost message, returning the previous count
    #[inline]
    pub fn record_lost(&self) -> u64 {
        self.lost.fetch_add(1, Ordering::Relaxed)
    }

    /// Loss rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been processed.
    pub fn loss_rate(&self) -> f64 {
        let lost = self.lost() as f64;
        let total = self.sent() as f64 + lost;
        if total == 0.0 {
            0.0
        } else {
            (lost / total) * 100.0
        }
    }
}

impl Default for TransportMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a transport, suitable for health reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransportStats {
    pub sent: u64,
    pub lost: u64,
    pub created_buffers: u64,
    pub skipped_buffers: u64,
    pub total_logged_count: u64,
    pub total_logged_length: u64,
    pub in_flight_bytes: u64,
    pub queued_messages: usize,
}

//! Buffered asynchronous transport
//!
//! Producers render records into pooled buffers and enqueue them without
//! blocking. A fixed pool of worker threads drains the queue into the writer.
//! Two ceilings bound the queue: a record count and an in-flight byte total.
//! A record that exceeds either is dropped at once and counted as lost.

use super::buffer_pool::{BufferPool, DEFAULT_POOL_SLOTS};
use super::config::LoggerConfig;
use super::error::{LoggerError, Result};
use super::metrics::{MetricsSink, TransportMetrics, TransportStats};
use crate::writers::Writer;
use crossbeam_channel::{after, at, bounded, never, select, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::io::{self, Write as _};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default shutdown timeout for transport cleanup (5 seconds)
///
/// Used when the transport is dropped without an explicit
/// [`BufferedTransport::shutdown`].
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How often `flush` re-checks delivery progress
pub const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Prefix of the stderr echo for failed records
const ECHO_PREFIX: &str = env!("CARGO_PKG_NAME");

/// Tunables of one transport
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub queue_capacity: usize,
    /// Ceiling on the summed capacity of queued buffers
    pub buffer_size: usize,
    pub worker_count: usize,
    /// Echo failed records on stderr
    pub error_writer: bool,
    pub max_reusable_buffer: usize,
}

impl From<&LoggerConfig> for TransportOptions {
    fn from(config: &LoggerConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            buffer_size: config.buffer_size,
            worker_count: config.worker_count,
            error_writer: config.error_writer,
            max_reusable_buffer: config.max_reusable_buffer,
        }
    }
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::from(&LoggerConfig::default())
    }
}

/// State shared by producers and workers
struct Shared {
    writer: Arc<dyn Writer>,
    pool: BufferPool,
    counters: TransportMetrics,
    metrics: Arc<dyn MetricsSink>,
    in_flight: AtomicU64,
    /// Monotonic byte totals; a flush waits for `completed` to reach the
    /// `enqueued` value it observed
    enqueued: AtomicU64,
    completed: AtomicU64,
    buffer_size: u64,
    error_writer: bool,
    live_workers: AtomicUsize,
}

pub struct BufferedTransport {
    shared: Arc<Shared>,
    sender: RwLock<Option<Sender<Vec<u8>>>>,
    /// Kept for queue depth only; never received from
    queue: Receiver<Vec<u8>>,
    queue_capacity: usize,
    closed: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl BufferedTransport {
    /// Start `worker_count` threads writing into `writer`
    pub fn new(
        writer: Arc<dyn Writer>,
        options: TransportOptions,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        if options.worker_count == 0 {
            return Err(LoggerError::config("transport", "worker_count must be positive"));
        }
        if options.queue_capacity == 0 {
            return Err(LoggerError::config("transport", "queue_capacity must be positive"));
        }

        let (sender, receiver) = bounded(options.queue_capacity);
        let shared = Arc::new(Shared {
            writer,
            pool: BufferPool::new(options.max_reusable_buffer, DEFAULT_POOL_SLOTS),
            counters: TransportMetrics::new(),
            metrics,
            in_flight: AtomicU64::new(0),
            enqueued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            buffer_size: options.buffer_size as u64,
            error_writer: options.error_writer,
            live_workers: AtomicUsize::new(options.worker_count),
        });

        let mut workers = Vec::with_capacity(options.worker_count);
        for id in 0..options.worker_count {
            let shared = Arc::clone(&shared);
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("log-transport-{}", id))
                .spawn(move || shared.run_worker(id, receiver))?;
            workers.push(handle);
        }

        Ok(Self {
            shared,
            sender: RwLock::new(Some(sender)),
            queue: receiver,
            queue_capacity: options.queue_capacity,
            closed: AtomicBool::new(false),
            workers: Mutex::new(workers),
        })
    }

    /// Render one record into a pooled buffer and enqueue it
    ///
    /// Never blocks. Fails with [`LoggerError::MemoryLimitExceeded`],
    /// [`LoggerError::QueueFull`] or [`LoggerError::Closed`]; in every case the
    /// record is counted as lost.
    pub fn submit<F>(&self, render: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<u8>),
    {
        let mut buf = self.shared.pool.get();
        render(&mut buf);

        self.shared.pool.observe(buf.len());
        self.shared.metrics.message_size(buf.len());

        if let Err((buf, err)) = self.enqueue(buf) {
            self.shared.on_failure(&buf, &err);
            self.shared.pool.put(buf);
            return Err(err);
        }
        Ok(())
    }

    fn enqueue(&self, buf: Vec<u8>) -> std::result::Result<(), (Vec<u8>, LoggerError)> {
        let sender = self.sender.read();
        let Some(sender) = sender.as_ref() else {
            return Err((buf, LoggerError::Closed));
        };

        let capacity = buf.capacity() as u64;
        let previous = self.shared.in_flight.fetch_add(capacity, Ordering::AcqRel);
        if previous + capacity > self.shared.buffer_size {
            self.shared.in_flight.fetch_sub(capacity, Ordering::AcqRel);
            let err = LoggerError::memory_limit(previous, capacity, self.shared.buffer_size);
            return Err((buf, err));
        }

        match sender.try_send(buf) {
            Ok(()) => {
                self.shared.enqueued.fetch_add(capacity, Ordering::AcqRel);
                self.shared.metrics.buffer_messages(1);
                self.shared.metrics.buffer_bytes(capacity as i64);
                Ok(())
            }
            Err(e) => {
                self.shared.in_flight.fetch_sub(capacity, Ordering::AcqRel);
                let err = match &e {
                    TrySendError::Full(_) => {
                        LoggerError::queue_full(sender.len(), self.queue_capacity)
                    }
                    TrySendError::Disconnected(_) => LoggerError::Closed,
                };
                Err((e.into_inner(), err))
            }
        }
    }

    /// Wait until everything queued before this call has been written
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        self.flush_until(Instant::now() + timeout, None)
    }

    /// [`flush`](Self::flush) with an absolute deadline and an optional
    /// cancellation channel
    ///
    /// A message on `cancel`, or its disconnection, ends the wait with
    /// [`LoggerError::Cancelled`].
    pub fn flush_until(&self, deadline: Instant, cancel: Option<&Receiver<()>>) -> Result<()> {
        if self.is_closed() {
            return Err(LoggerError::Closed);
        }

        let target = self.shared.enqueued.load(Ordering::Acquire);

        let idle = never();
        let cancel = cancel.unwrap_or(&idle);
        let timeout = at(deadline);

        while !self.shared.flushed(target) {
            select! {
                recv(after(FLUSH_POLL_INTERVAL)) -> _ => {}
                recv(timeout) -> _ => return Err(LoggerError::DeadlineExceeded),
                recv(cancel) -> _ => return Err(LoggerError::Cancelled),
            }
        }
        Ok(())
    }

    /// Async counterpart of [`flush`](Self::flush) for tokio runtimes
    #[cfg(feature = "async-flush")]
    pub async fn flush_async(&self, timeout: Duration) -> Result<()> {
        if self.is_closed() {
            return Err(LoggerError::Closed);
        }

        let target = self.shared.enqueued.load(Ordering::Acquire);

        let deadline = tokio::time::Instant::now() + timeout;
        while !self.shared.flushed(target) {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(LoggerError::DeadlineExceeded);
            }
            tokio::time::sleep(FLUSH_POLL_INTERVAL.min(deadline - now)).await;
        }
        Ok(())
    }

    /// Stop accepting records
    ///
    /// Idempotent and non-blocking. Workers drain what is already queued and
    /// the last one to exit closes the writer.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        drop(self.sender.write().take());
        tracing::debug!(writer = self.shared.writer.name(), "log transport closing");
    }

    /// Close, then wait for the workers to drain the queue
    ///
    /// Returns `true` if every worker finished within `timeout`.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.close();

        let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        let start = Instant::now();
        let mut clean = true;

        for handle in handles {
            loop {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        eprintln!("[LOGGER ERROR] Transport worker panicked during shutdown");
                        clean = false;
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    eprintln!(
                        "[LOGGER WARNING] Transport worker did not finish within {:?}. \
                         Some logs may be lost.",
                        timeout
                    );
                    return false;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }

        clean
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> TransportStats {
        let pool = &self.shared.pool;
        TransportStats {
            sent: self.shared.counters.sent(),
            lost: self.shared.counters.lost(),
            created_buffers: pool.created(),
            skipped_buffers: pool.skipped(),
            total_logged_count: pool.total_logged_count(),
            total_logged_length: pool.total_logged_length(),
            in_flight_bytes: self.shared.in_flight.load(Ordering::Acquire),
            queued_messages: self.queue.len(),
        }
    }

    /// Delivery counters
    pub fn metrics(&self) -> &TransportMetrics {
        &self.shared.counters
    }

    pub fn writer_name(&self) -> &str {
        self.shared.writer.name()
    }
}

impl Drop for BufferedTransport {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

        let lost = self.shared.counters.lost();
        if lost > 0 {
            tracing::warn!(
                lost,
                loss_rate = self.shared.counters.loss_rate(),
                "log transport shut down with lost messages"
            );
        }
    }
}

impl Shared {
    fn flushed(&self, target: u64) -> bool {
        self.completed.load(Ordering::Acquire) >= target
    }

    fn run_worker(&self, id: usize, receiver: Receiver<Vec<u8>>) {
        tracing::debug!(worker = id, "log transport worker started");

        for buf in receiver.iter() {
            self.deliver(buf);
        }

        tracing::debug!(worker = id, "log transport worker exiting");
        if self.live_workers.fetch_sub(1, Ordering::AcqRel) == 1 {
            if let Err(e) = self.writer.close() {
                tracing::debug!(error = %e, "closing log writer failed");
            }
        }
    }

    fn deliver(&self, buf: Vec<u8>) {
        let capacity = buf.capacity() as u64;

        let start = Instant::now();
        let result = self.writer.write(&buf);
        self.metrics.write_latency(start.elapsed());

        match result {
            Ok(n) if n == buf.len() => {
                self.pool.put(buf);
                self.counters.record_sent();
            }
            Ok(n) => self.on_failure(&buf, &LoggerError::ShortWrite {
                written: n,
                expected: buf.len(),
            }),
            Err(e) => self.on_failure(&buf, &e),
        }

        self.release(capacity);
    }

    fn release(&self, capacity: u64) {
        self.in_flight.fetch_sub(capacity, Ordering::AcqRel);
        self.completed.fetch_add(capacity, Ordering::AcqRel);
        self.metrics.buffer_messages(-1);
        self.metrics.buffer_bytes(-(capacity as i64));
    }

    fn on_failure(&self, record: &[u8], err: &LoggerError) {
        let previous = self.counters.record_lost();
        self.metrics.lost_message(err.lost_category());

        // Alert on first loss and periodically thereafter
        if previous == 0 || (previous + 1).is_multiple_of(1000) {
            tracing::warn!(
                lost = previous + 1,
                category = %err.lost_category(),
                error = %err,
                "log records are being lost"
            );
        }

        if self.error_writer {
            echo_failure(record, err);
        }
    }
}

/// Side channel for records that could not be delivered
fn echo_failure(record: &[u8], err: &LoggerError) {
    let line = format!(
        "{}: {}; original message: {}",
        ECHO_PREFIX,
        err,
        String::from_utf8_lossy(record)
    );
    let _ = io::stderr().lock().write_all(line.as_bytes());
}

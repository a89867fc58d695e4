//! Reusable record buffers
//!
//! Buffers travel formatter → queue → worker and come back here after a
//! successful write. A returned buffer is kept only while its capacity stays
//! close to the records actually being logged, so one oversized record does not
//! pin a large allocation for the lifetime of the process.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};

/// Default capacity ceiling for buffers that may be reused
pub const DEFAULT_MAX_REUSABLE_CAPACITY: usize = 16 * 1024;

/// Default number of idle buffers kept on the free list
pub const DEFAULT_POOL_SLOTS: usize = 1024;

/// Reused buffers may be at most this many times the average record length
const AVERAGE_FACTOR: u64 = 3;

#[derive(Debug)]
pub struct BufferPool {
    free_tx: Sender<Vec<u8>>,
    free_rx: Receiver<Vec<u8>>,
    max_reusable_capacity: usize,
    created: AtomicU64,
    skipped: AtomicU64,
    total_logged_length: AtomicU64,
    total_logged_count: AtomicU64,
}

impl BufferPool {
    pub fn new(max_reusable_capacity: usize, slots: usize) -> Self {
        let (free_tx, free_rx) = bounded(slots.max(1));
        Self {
            free_tx,
            free_rx,
            max_reusable_capacity,
            created: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            total_logged_length: AtomicU64::new(0),
            total_logged_count: AtomicU64::new(0),
        }
    }

    /// Take an empty buffer, allocating when the free list is empty
    pub fn get(&self) -> Vec<u8> {
        match self.free_rx.try_recv() {
            Ok(buf) => buf,
            Err(_) => {
                self.created.fetch_add(1, Ordering::Relaxed);
                Vec::new()
            }
        }
    }

    /// Account one rendered record of `len` bytes
    pub fn observe(&self, len: usize) {
        self.total_logged_length
            .fetch_add(len as u64, Ordering::Relaxed);
        self.total_logged_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a buffer; it is cleared and either kept or dropped
    pub fn put(&self, mut buf: Vec<u8>) {
        if !self.is_reusable(buf.capacity()) {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        buf.clear();
        // A full free list just lets the buffer go
        let _ = self.free_tx.try_send(buf);
    }

    fn is_reusable(&self, capacity: usize) -> bool {
        if capacity > self.max_reusable_capacity {
            return false;
        }
        let count = self.total_logged_count.load(Ordering::Relaxed);
        if count == 0 {
            return true;
        }
        let average = self.total_logged_length.load(Ordering::Relaxed) / count;
        capacity as u64 <= AVERAGE_FACTOR * average
    }

    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn total_logged_length(&self) -> u64 {
        self.total_logged_length.load(Ordering::Relaxed)
    }

    pub fn total_logged_count(&self) -> u64 {
        self.total_logged_count.load(Ordering::Relaxed)
    }

    /// Idle buffers currently on the free list
    pub fn idle(&self) -> usize {
        self.free_rx.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REUSABLE_CAPACITY, DEFAULT_POOL_SLOTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_allocates_then_reuses() {
        let pool = BufferPool::default();
        let mut buf = pool.get();
        assert_eq!(pool.created(), 1);

        buf.extend_from_slice(b"hello");
        pool.observe(buf.len());
        let capacity = buf.capacity();
        pool.put(buf);
        assert_eq!(pool.idle(), 1);

        let buf = pool.get();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), capacity);
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_oversized_buffer_is_skipped() {
        let pool = BufferPool::new(1024, 8);
        pool.put(Vec::with_capacity(4096));
        assert_eq!(pool.skipped(), 1);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_buffer_far_above_average_is_skipped() {
        let pool = BufferPool::default();
        for _ in 0..10 {
            pool.observe(100);
        }

        pool.put(Vec::with_capacity(300));
        assert_eq!(pool.skipped(), 0);

        pool.put(Vec::with_capacity(301));
        assert_eq!(pool.skipped(), 1);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_full_free_list_drops_buffer() {
        let pool = BufferPool::new(1024, 1);
        pool.put(Vec::with_capacity(8));
        pool.put(Vec::with_capacity(8));
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.skipped(), 0);
    }

    #[test]
    fn test_observe_totals() {
        let pool = BufferPool::default();
        pool.observe(10);
        pool.observe(30);
        assert_eq!(pool.total_logged_count(), 2);
        assert_eq!(pool.total_logged_length(), 40);
    }
}

//! Non-blocking Unix datagram writer
//!
//! Sends each record with `send_to` on an unbound, non-blocking socket. A full
//! receive buffer on the other side shows up as `WouldBlock`; the writer then
//! spins with a short sleep for a bounded number of attempts. The budget shrinks
//! as would-block errors pile up, so a stalled reader costs each record less
//! time. Once the cumulative count passes `errors_before_reconnect` the failure
//! is reported as transient so the reconnecting writer opens a fresh socket;
//! below that it is permanent and the record is dropped without a retry.

use super::Writer;
use crate::core::config::BackoffPolicy;
use crate::core::error::{LoggerError, Result};
use parking_lot::RwLock;
use std::io;
use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

pub struct NonBlockingDatagramWriter {
    socket: RwLock<Option<UnixDatagram>>,
    path: PathBuf,
    errors: AtomicU64,
    backoff: BackoffPolicy,
}

impl NonBlockingDatagramWriter {
    pub fn new(path: impl Into<PathBuf>, backoff: BackoffPolicy) -> Result<Self> {
        let socket = UnixDatagram::unbound()?;
        socket.set_nonblocking(true)?;

        Ok(Self {
            socket: RwLock::new(Some(socket)),
            path: path.into(),
            errors: AtomicU64::new(0),
            backoff,
        })
    }

    /// Would-block errors since the last successful send
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        let guard = self.socket.read();
        match guard.as_ref() {
            Some(socket) => socket.send_to(buf, &self.path),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "socket closed")),
        }
    }
}

impl Writer for NonBlockingDatagramWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut attempts = self.backoff.attempts(self.errors.load(Ordering::Relaxed));

        loop {
            match self.send(buf) {
                Ok(n) => {
                    self.errors.store(0, Ordering::Relaxed);
                    return Ok(n);
                }
                Err(e) => {
                    if e.kind() == io::ErrorKind::WouldBlock {
                        self.errors.fetch_add(1, Ordering::Relaxed);
                        if attempts > 1 {
                            attempts -= 1;
                            thread::sleep(self.backoff.pause());
                            continue;
                        }
                    }

                    if self.errors.load(Ordering::Relaxed) > self.backoff.errors_before_reconnect {
                        self.errors.store(0, Ordering::Relaxed);
                        return Err(LoggerError::write(e));
                    }
                    return Err(LoggerError::do_not_retry(e));
                }
            }
        }
    }

    fn close(&self) -> Result<()> {
        self.socket.write().take();
        Ok(())
    }

    fn name(&self) -> &str {
        "unixgram_nonblocking"
    }
}

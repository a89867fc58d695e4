//! Writer that redials its connection after a failed write
//!
//! Writes share the connection under a read lock. After a failure the writer
//! takes the write lock, reconnects once and retries the record once. When
//! several workers fail on the same connection only the first one redials; the
//! others see the generation counter moved and just retry.

use super::{Dialer, Writer};
use crate::core::error::{LoggerError, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    /// Terminal
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Closed,
            _ => ConnectionState::Disconnected,
        }
    }
}

pub struct ReconnectingWriter {
    network: String,
    address: String,
    dialer: Dialer,
    conn: RwLock<Option<Box<dyn Writer>>>,
    /// Bumped on every reconnect attempt, only under the write lock
    generation: AtomicU64,
    state: AtomicU8,
}

impl ReconnectingWriter {
    /// Dial immediately; a failed first dial leaves the writer disconnected
    /// and the next write tries again
    pub fn new(network: impl Into<String>, address: impl Into<String>, dialer: Dialer) -> Self {
        let writer = Self {
            network: network.into(),
            address: address.into(),
            dialer,
            conn: RwLock::new(None),
            generation: AtomicU64::new(0),
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
        };

        {
            let mut conn = writer.conn.write();
            writer.connect(&mut conn);
        }
        writer
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Number of reconnect attempts so far, the initial dial included
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Replace the connection; caller holds the write lock
    fn connect(&self, conn: &mut Option<Box<dyn Writer>>) -> bool {
        if let Some(old) = conn.take() {
            if let Err(e) = old.close() {
                tracing::debug!(network = %self.network, error = %e, "closing stale connection failed");
            }
        }

        self.set_state(ConnectionState::Connecting);
        self.generation.fetch_add(1, Ordering::AcqRel);

        match (self.dialer)(&self.network, &self.address) {
            Ok(writer) => {
                tracing::debug!(
                    network = %self.network,
                    address = %self.address,
                    writer = writer.name(),
                    "log sink connected"
                );
                *conn = Some(writer);
                self.set_state(ConnectionState::Connected);
                true
            }
            Err(e) => {
                tracing::debug!(
                    network = %self.network,
                    address = %self.address,
                    error = %e,
                    "log sink dial failed"
                );
                self.set_state(ConnectionState::Disconnected);
                false
            }
        }
    }

    fn reconnect(&self, observed: u64) -> Result<()> {
        let mut conn = self.conn.write();
        if self.state() == ConnectionState::Closed {
            return Err(LoggerError::Closed);
        }
        if conn.is_some() && self.generation.load(Ordering::Acquire) != observed {
            return Ok(());
        }
        if self.connect(&mut conn) {
            Ok(())
        } else {
            Err(LoggerError::NotConnected)
        }
    }
}

impl Writer for ReconnectingWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let observed = {
            let conn = self.conn.read();
            if self.state() == ConnectionState::Closed {
                return Err(LoggerError::Closed);
            }
            let generation = self.generation.load(Ordering::Acquire);
            if let Some(writer) = conn.as_ref() {
                match writer.write(buf) {
                    Ok(n) => return Ok(n),
                    Err(e) if e.is_permanent() => return Err(e),
                    Err(e) => {
                        tracing::debug!(network = %self.network, error = %e, "write failed, reconnecting");
                    }
                }
            }
            generation
        };

        self.reconnect(observed)?;

        let conn = self.conn.read();
        match conn.as_ref() {
            Some(writer) => writer.write(buf),
            None => Err(LoggerError::NotConnected),
        }
    }

    fn close(&self) -> Result<()> {
        let mut conn = self.conn.write();
        if self.state() == ConnectionState::Closed {
            return Ok(());
        }
        self.set_state(ConnectionState::Closed);
        match conn.take() {
            Some(writer) => writer.close(),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "reconnecting"
    }
}

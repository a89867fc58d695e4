//! Error types for the logging transport

use super::metrics::LostCategory;
use std::io;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Queue depth reached its configured count capacity
    #[error("Log queue is out of capacity: {current}/{max} messages queued")]
    QueueFull { current: usize, max: usize },

    /// Accepting the record would exceed the in-flight byte ceiling
    #[error("Memory limit is reached: {in_flight} bytes in flight + {requested} requested > {limit}")]
    MemoryLimitExceeded {
        in_flight: u64,
        requested: u64,
        limit: u64,
    },

    /// Flush deadline passed before the watermark drained
    #[error("Flush deadline exceeded")]
    DeadlineExceeded,

    /// Flush was cancelled by the caller
    #[error("Flush cancelled")]
    Cancelled,

    /// Transport or writer already closed
    #[error("Log transport closed")]
    Closed,

    /// Dialing the sink failed
    #[error("Failed to connect to {network} '{address}': {source}")]
    Connect {
        network: String,
        address: String,
        #[source]
        source: io::Error,
    },

    /// Write failed in a way that a reconnect may cure
    #[error("Write failed: {source}")]
    Write {
        #[source]
        source: io::Error,
    },

    /// Write failed and must not be retried for this record
    #[error("Write failed (do not retry): {source}")]
    DoNotRetry {
        #[source]
        source: io::Error,
    },

    /// No live connection to write to
    #[error("Writer is not connected")]
    NotConnected,

    /// Sink accepted fewer bytes than the record holds
    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create a queue full error with depth details
    pub fn queue_full(current: usize, max: usize) -> Self {
        LoggerError::QueueFull { current, max }
    }

    pub fn memory_limit(in_flight: u64, requested: u64, limit: u64) -> Self {
        LoggerError::MemoryLimitExceeded {
            in_flight,
            requested,
            limit,
        }
    }

    pub fn connect(network: impl Into<String>, address: impl Into<String>, source: io::Error) -> Self {
        LoggerError::Connect {
            network: network.into(),
            address: address.into(),
            source,
        }
    }

    /// Transient write failure; the reconnecting writer will redial once
    pub fn write(source: io::Error) -> Self {
        LoggerError::Write { source }
    }

    /// Permanent write failure; skips reconnect and retry
    pub fn do_not_retry(source: io::Error) -> Self {
        LoggerError::DoNotRetry { source }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether the failure bypasses the reconnect-and-retry path
    pub fn is_permanent(&self) -> bool {
        matches!(self, LoggerError::DoNotRetry { .. })
    }

    /// Label used by the lost-message metric
    pub fn lost_category(&self) -> LostCategory {
        match self {
            LoggerError::QueueFull { .. } => LostCategory::Capacity,
            LoggerError::MemoryLimitExceeded { .. } => LostCategory::Memory,
            LoggerError::Connect { .. }
            | LoggerError::NotConnected
            | LoggerError::ShortWrite { .. } => LostCategory::Connection,
            LoggerError::Write { source } | LoggerError::DoNotRetry { source } => {
                if is_connection_error(source) {
                    LostCategory::Connection
                } else {
                    LostCategory::Unknown
                }
            }
            LoggerError::IoError(source) if is_connection_error(source) => LostCategory::Connection,
            _ => LostCategory::Unknown,
        }
    }
}

fn is_connection_error(err: &io::Error) -> bool {
    use io::ErrorKind::*;
    matches!(
        err.kind(),
        ConnectionRefused
            | ConnectionReset
            | ConnectionAborted
            | NotConnected
            | BrokenPipe
            | NotFound
            | WouldBlock
            | TimedOut
            | AddrNotAvailable
    )
}

//! Logger configuration
//!
//! Every field has a default, so a JSON document only needs to name what it
//! changes:
//!
//! ```
//! use rust_log_transport::core::LoggerConfig;
//!
//! let config = LoggerConfig::from_json(
//!     r#"{"service":"billing","network":"unixgram","address":"/dev/log","level":"INFO"}"#,
//! ).unwrap();
//! assert_eq!(config.worker_count, 4);
//! assert!(config.syslog_header_enabled());
//! ```

use super::buffer_pool::DEFAULT_MAX_REUSABLE_CAPACITY;
use super::error::{LoggerError, Result};
use super::format::{local_hostname, FormatterConfig, DEFAULT_MAX_RECORD_SIZE, MIN_RECORD_SIZE};
use super::severity::Severity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default in-flight byte ceiling (32 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024 * 1024;

/// Default queue capacity in messages
pub const DEFAULT_QUEUE_CAPACITY: usize = 65_536;

/// Default number of writer threads
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Retry policy of the non-blocking datagram writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Upper bound on send attempts per record
    pub max_attempts: u64,
    /// Cumulative would-block count after which a failure asks for reconnect
    pub errors_before_reconnect: u64,
    /// Sleep between attempts, in nanoseconds
    pub pause_nanos: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2000,
            errors_before_reconnect: 1_000_000,
            pause_nanos: 1,
        }
    }
}

impl BackoffPolicy {
    pub fn pause(&self) -> Duration {
        Duration::from_nanos(self.pause_nanos)
    }

    /// Attempts allowed for the next record given the current error count
    pub fn attempts(&self, errors: u64) -> u64 {
        if errors >= self.max_attempts {
            1
        } else {
            self.max_attempts - errors
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub service: String,
    /// Socket type; empty means stdout
    pub network: String,
    /// Socket address or path; empty means stdout
    pub address: String,
    pub level: Severity,
    /// Ceiling on bytes held by queued records
    pub buffer_size: usize,
    /// Ceiling on queued records
    pub queue_capacity: usize,
    pub worker_count: usize,
    /// Echo failed records on stderr
    pub error_writer: bool,
    /// `None` turns the PRI header on exactly when a socket is configured
    pub syslog_header: Option<bool>,
    /// Module paths stepped over when resolving the caller
    pub backtrace_skips: Vec<String>,
    pub max_record_size: usize,
    pub max_reusable_buffer: usize,
    /// `None` uses the system hostname
    pub hostname: Option<String>,
    pub backoff: BackoffPolicy,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            service: String::new(),
            network: String::new(),
            address: String::new(),
            level: Severity::Debug,
            buffer_size: DEFAULT_BUFFER_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_count: DEFAULT_WORKER_COUNT,
            error_writer: true,
            syslog_header: None,
            backtrace_skips: Vec::new(),
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            max_reusable_buffer: DEFAULT_MAX_REUSABLE_CAPACITY,
            hostname: None,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl LoggerConfig {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(LoggerError::config("LoggerConfig", "worker_count must be positive"));
        }
        if self.queue_capacity == 0 {
            return Err(LoggerError::config("LoggerConfig", "queue_capacity must be positive"));
        }
        if self.buffer_size == 0 {
            return Err(LoggerError::config("LoggerConfig", "buffer_size must be positive"));
        }
        if self.max_record_size < MIN_RECORD_SIZE {
            return Err(LoggerError::config(
                "LoggerConfig",
                format!(
                    "max_record_size {} is below the minimum of {} bytes",
                    self.max_record_size, MIN_RECORD_SIZE
                ),
            ));
        }
        if self.backoff.max_attempts == 0 {
            return Err(LoggerError::config("backoff", "max_attempts must be positive"));
        }
        Ok(())
    }

    /// Whether records start with a syslog PRI header
    pub fn syslog_header_enabled(&self) -> bool {
        self.syslog_header
            .unwrap_or(!self.network.is_empty() && !self.address.is_empty())
    }

    pub fn formatter_config(&self) -> FormatterConfig {
        FormatterConfig {
            hostname: self.hostname.clone().unwrap_or_else(local_hostname),
            service: self.service.clone(),
            syslog_header: self.syslog_header_enabled(),
            max_record_size: self.max_record_size,
            backtrace_skips: self.backtrace_skips.clone(),
        }
    }
}

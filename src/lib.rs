//! # Rust Log Transport
//!
//! A structured logging transport for services that ship their logs to a
//! local syslog-style collector. Records are rendered into a fixed
//! pipe-delimited layout, queued without blocking the caller and written by a
//! small pool of worker threads.
//!
//! ## Features
//!
//! - **Non-blocking**: Callers never wait on the socket; a full queue drops
//!   the record and counts it
//! - **Bounded**: Both the number of queued records and the bytes they hold
//!   are capped
//! - **Resilient**: Connections are re-established on failure, and a
//!   non-blocking datagram writer backs off when the collector is saturated
//! - **Observable**: Delivered and lost records are counted and can be
//!   forwarded to a metrics backend
//!
//! ## Example
//!
//! ```no_run
//! use rust_log_transport::prelude::*;
//! use std::time::Duration;
//!
//! let logger = Logger::builder()
//!     .service("billing")
//!     .connect("unixgram", "/dev/log")
//!     .level(Severity::Info)
//!     .build()
//!     .unwrap();
//!
//! logger.info("service started");
//! logger.flush(Duration::from_secs(1)).unwrap();
//! ```

pub mod core;
pub mod macros;
pub mod writers;

pub mod prelude {
    pub use crate::core::{
        BackoffPolicy, CallSite, CollectedSpan, FieldValue, FormatterConfig, LogEvent, Logger,
        LoggerBuilder, LoggerConfig, LoggerError, MetricsSink, Result, Severity, Span,
        StructuredData, TransportRegistry, TransportStats, DEFAULT_FLUSH_TIMEOUT,
    };
    pub use crate::writers::{Dialer, Writer};
}

pub use core::{
    BackoffPolicy, BufferedTransport, CallSite, CollectedSpan, FieldValue, FormatterConfig,
    LogEvent, Logger, LoggerBuilder, LoggerConfig, LoggerError, LostCategory, MetricsSink,
    NoopMetrics, Result, Severity, Span, SpanCollector, StructuredData, TransportRegistry,
    TransportStats, DEFAULT_FLUSH_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use writers::{Dialer, Writer};

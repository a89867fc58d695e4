//! Core logger types and traits

pub mod buffer_pool;
pub mod caller;
pub mod collector;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod logger;
pub mod metrics;
pub mod payload;
pub mod registry;
pub mod severity;
pub mod span;
pub mod transport;

pub use buffer_pool::BufferPool;
pub use caller::Caller;
pub use collector::{mask_passwords, CollectedSpan, SpanCollector};
pub use config::{BackoffPolicy, LoggerConfig};
pub use error::{LoggerError, Result};
pub use event::{CallSite, LogEvent};
pub use format::{CeeRecord, FormatterConfig, Render};
pub use logger::{Logger, LoggerBuilder, DEFAULT_FLUSH_TIMEOUT};
pub use metrics::{LostCategory, MetricsSink, NoopMetrics, TransportMetrics, TransportStats};
pub use payload::{FieldValue, StructuredData};
pub use registry::{TransportKey, TransportRegistry};
pub use severity::{AtomicSeverity, ParseSeverityError, Severity};
pub use span::Span;
pub use transport::{BufferedTransport, TransportOptions, DEFAULT_SHUTDOWN_TIMEOUT};

//! Logger facade

use super::collector::SpanCollector;
use super::config::{BackoffPolicy, LoggerConfig};
use super::error::Result;
use super::event::{CallSite, LogEvent};
use super::format::{FormatterConfig, Render};
use super::metrics::{MetricsSink, NoopMetrics, TransportStats};
use super::payload::StructuredData;
use super::registry::{TransportKey, TransportRegistry};
use super::severity::{AtomicSeverity, Severity};
use super::span::Span;
use super::transport::{BufferedTransport, TransportOptions};
use crate::writers::{default_dialer, Dialer, ReconnectingWriter, Writer};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Flush timeout for orderly shutdown paths
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry entry to remove when the logger closes
struct Registration {
    registry: Weak<TransportRegistry>,
    key: TransportKey,
}

pub struct Logger {
    transport: Arc<BufferedTransport>,
    formatter: Arc<FormatterConfig>,
    level: AtomicSeverity,
    registration: Option<Registration>,
    closed: AtomicBool,
}

impl Logger {
    /// Build a logger from a configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_log_transport::prelude::*;
    ///
    /// let config = LoggerConfig {
    ///     service: "billing".into(),
    ///     network: "unixgram".into(),
    ///     address: "/dev/log".into(),
    ///     ..LoggerConfig::default()
    /// };
    /// let logger = Logger::new(config).unwrap();
    /// logger.info("service started");
    /// ```
    pub fn new(config: LoggerConfig) -> Result<Self> {
        LoggerBuilder::from_config(config).build()
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub(crate) fn from_parts(
        transport: Arc<BufferedTransport>,
        formatter: FormatterConfig,
        level: Severity,
        registration: Option<(Weak<TransportRegistry>, TransportKey)>,
    ) -> Self {
        Self {
            transport,
            formatter: formatter.shared(),
            level: AtomicSeverity::new(level),
            registration: registration.map(|(registry, key)| Registration { registry, key }),
            closed: AtomicBool::new(false),
        }
    }

    /// Current threshold
    pub fn level(&self) -> Severity {
        self.level.load()
    }

    pub fn set_level(&self, level: Severity) {
        self.level.store(level);
    }

    /// Whether a record at `severity` passes the threshold
    #[inline]
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.level.load()
    }

    pub fn service(&self) -> &str {
        &self.formatter.service
    }

    pub fn formatter(&self) -> &FormatterConfig {
        &self.formatter
    }

    /// Enqueue a prepared event
    pub fn record(&self, severity: Severity, event: &LogEvent) -> Result<()> {
        self.record_with(severity, event)
    }

    /// Enqueue anything that renders into a record
    pub fn record_with<R: Render + ?Sized>(&self, severity: Severity, record: &R) -> Result<()> {
        if !self.enabled(severity) {
            return Ok(());
        }
        let formatter = &self.formatter;
        self.transport
            .submit(|buf| record.render(severity, formatter, buf))
    }

    /// Log a message with explicit tracing and call-site information
    pub fn log(
        &self,
        call_site: CallSite,
        span: &Span,
        severity: Severity,
        message: impl Into<String>,
        data: Option<StructuredData>,
    ) -> Result<()> {
        if !self.enabled(severity) {
            return Ok(());
        }
        self.record_with(severity, &build_event(call_site, span, message.into(), data))
    }

    /// Like [`log`](Self::log); the message is only formatted once the
    /// threshold check has passed
    pub fn logf(
        &self,
        call_site: CallSite,
        span: &Span,
        severity: Severity,
        args: fmt::Arguments<'_>,
        data: Option<StructuredData>,
    ) -> Result<()> {
        if !self.enabled(severity) {
            return Ok(());
        }
        self.record_with(severity, &build_event(call_site, span, args.to_string(), data))
    }

    fn log_message(&self, severity: Severity, message: impl Into<String>) {
        if !self.enabled(severity) {
            return;
        }
        // Enqueue failures are already counted and echoed by the transport
        let _ = self.record_with(severity, &LogEvent::new(message));
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log_message(Severity::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log_message(Severity::Info, message);
    }

    #[inline]
    pub fn notice(&self, message: impl Into<String>) {
        self.log_message(Severity::Notice, message);
    }

    #[inline]
    pub fn warning(&self, message: impl Into<String>) {
        self.log_message(Severity::Warning, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log_message(Severity::Error, message);
    }

    #[inline]
    pub fn critical(&self, message: impl Into<String>) {
        self.log_message(Severity::Critical, message);
    }

    #[inline]
    pub fn alert(&self, message: impl Into<String>) {
        self.log_message(Severity::Alert, message);
    }

    #[inline]
    pub fn emergency(&self, message: impl Into<String>) {
        self.log_message(Severity::Emergency, message);
    }

    /// Wait up to `timeout` for queued records to be written
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        self.transport.flush(timeout)
    }

    pub fn flush_until(
        &self,
        deadline: Instant,
        cancel: Option<&crossbeam_channel::Receiver<()>>,
    ) -> Result<()> {
        self.transport.flush_until(deadline, cancel)
    }

    #[cfg(feature = "async-flush")]
    pub async fn flush_async(&self, timeout: Duration) -> Result<()> {
        self.transport.flush_async(timeout).await
    }

    /// Stop logging through this logger's transport
    ///
    /// Idempotent. Removes the registry entry, if any, and closes the
    /// transport; loggers sharing the transport are closed with it.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(registration) = &self.registration {
            if let Some(registry) = registration.registry.upgrade() {
                registry.remove(&registration.key);
            }
        }
        self.transport.close();
    }

    /// Close and wait for queued records to drain
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.close();
        self.transport.shutdown(timeout)
    }

    pub fn stats(&self) -> TransportStats {
        self.transport.stats()
    }

    /// Collector that writes tracing spans through this logger
    pub fn span_collector(&self) -> SpanCollector<'_> {
        SpanCollector::new(self)
    }

    pub(crate) fn transport(&self) -> &Arc<BufferedTransport> {
        &self.transport
    }
}

fn build_event(
    call_site: CallSite,
    span: &Span,
    message: String,
    data: Option<StructuredData>,
) -> LogEvent {
    let mut event = LogEvent::new(message)
        .with_span(span.clone())
        .with_call_site(call_site);
    event.data = data;
    event
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("service", &self.formatter.service)
            .field("level", &self.level())
            .field("writer", &self.transport.writer_name())
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```no_run
/// use rust_log_transport::prelude::*;
///
/// let logger = Logger::builder()
///     .service("billing")
///     .connect("udp", "127.0.0.1:514")
///     .level(Severity::Info)
///     .worker_count(2)
///     .build()
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    writer: Option<Arc<dyn Writer>>,
    dialer: Option<Dialer>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::from_config(LoggerConfig::default())
    }

    pub fn from_config(config: LoggerConfig) -> Self {
        Self {
            config,
            writer: None,
            dialer: None,
            metrics: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.config.service = service.into();
        self
    }

    /// Socket to write to; an empty network or address means stdout
    #[must_use = "builder methods return a new value"]
    pub fn connect(mut self, network: impl Into<String>, address: impl Into<String>) -> Self {
        self.config.network = network.into();
        self.config.address = address.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: Severity) -> Self {
        self.config.level = level;
        self
    }

    /// Ceiling on bytes held by queued records
    #[must_use = "builder methods return a new value"]
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.config.buffer_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, messages: usize) -> Self {
        self.config.queue_capacity = messages;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn worker_count(mut self, workers: usize) -> Self {
        self.config.worker_count = workers;
        self
    }

    /// Echo records that could not be delivered on stderr
    ///
    /// Default: enabled
    #[must_use = "builder methods return a new value"]
    pub fn error_writer(mut self, enabled: bool) -> Self {
        self.config.error_writer = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn syslog_header(mut self, enabled: bool) -> Self {
        self.config.syslog_header = Some(enabled);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backtrace_skips<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.backtrace_skips = packages.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_record_size(mut self, bytes: usize) -> Self {
        self.config.max_record_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_reusable_buffer(mut self, bytes: usize) -> Self {
        self.config.max_reusable_buffer = bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.config.hostname = Some(hostname.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// Write through `writer` instead of dialing `network`/`address`
    #[must_use = "builder methods return a new value"]
    pub fn writer(mut self, writer: Arc<dyn Writer>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Replace the function used to open connections
    #[must_use = "builder methods return a new value"]
    pub fn dialer(mut self, dialer: Dialer) -> Self {
        self.dialer = Some(dialer);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<Logger> {
        self.config.validate()?;

        let metrics = self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics));
        let writer = match self.writer {
            Some(writer) => writer,
            None => {
                let dialer = self
                    .dialer
                    .unwrap_or_else(|| default_dialer(self.config.backoff.clone()));
                Arc::new(ReconnectingWriter::new(
                    self.config.network.clone(),
                    self.config.address.clone(),
                    dialer,
                ))
            }
        };

        let transport =
            BufferedTransport::new(writer, TransportOptions::from(&self.config), metrics)?;

        Ok(Logger::from_parts(
            Arc::new(transport),
            self.config.formatter_config(),
            self.config.level,
            None,
        ))
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryWriter {
        records: Mutex<Vec<String>>,
    }

    impl MemoryWriter {
        fn records(&self) -> Vec<String> {
            self.records.lock().unwrap().clone()
        }
    }

    impl Writer for MemoryWriter {
        fn write(&self, buf: &[u8]) -> Result<usize> {
            self.records
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(buf).into_owned());
            Ok(buf.len())
        }

        fn close(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "memory"
        }
    }

    fn logger(writer: Arc<MemoryWriter>, level: Severity) -> Logger {
        Logger::builder()
            .service("billing")
            .hostname("host-1")
            .level(level)
            .worker_count(1)
            .error_writer(false)
            .writer(writer)
            .build()
            .unwrap()
    }

    fn parts(record: &str) -> Vec<&str> {
        record.split(" | ").collect()
    }

    #[test]
    fn test_severity_gate() {
        let writer = Arc::new(MemoryWriter::default());
        let logger = logger(writer.clone(), Severity::Warning);

        logger.info("dropped by threshold");
        logger.warning("disk low");
        logger.flush(DEFAULT_FLUSH_TIMEOUT).unwrap();

        let records = writer.records();
        assert_eq!(records.len(), 1);
        let parts = parts(&records[0]);
        assert_eq!(parts.len(), 13);
        assert_eq!(parts[6], "billing");
        assert_eq!(parts[7], "WARNING");
        assert_eq!(parts[10], "disk low");
        assert_eq!(parts[12], ".\n");
    }

    #[test]
    fn test_set_level() {
        let writer = Arc::new(MemoryWriter::default());
        let logger = logger(writer.clone(), Severity::Error);
        assert!(!logger.enabled(Severity::Debug));

        logger.set_level(Severity::Debug);
        assert_eq!(logger.level(), Severity::Debug);
        assert!(logger.enabled(Severity::Debug));

        logger.debug("now visible");
        logger.flush(DEFAULT_FLUSH_TIMEOUT).unwrap();
        assert_eq!(writer.records().len(), 1);
    }

    #[test]
    fn test_logf_skips_formatting_below_threshold() {
        struct Explosive;
        impl fmt::Display for Explosive {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                panic!("formatted below threshold");
            }
        }

        let writer = Arc::new(MemoryWriter::default());
        let logger = logger(writer, Severity::Error);
        logger
            .logf(
                CallSite::Disabled,
                &Span::default(),
                Severity::Debug,
                format_args!("{}", Explosive),
                None,
            )
            .unwrap();
    }

    #[test]
    fn test_log_with_span_and_data() {
        let writer = Arc::new(MemoryWriter::default());
        let logger = logger(writer.clone(), Severity::Debug);

        logger
            .log(
                CallSite::Static {
                    module: "billing::api",
                    file: "src/api.rs",
                    line: 12,
                },
                &Span::new("trace-1", "span-2").with_parent("span-1"),
                Severity::Notice,
                "charged",
                Some(StructuredData::new().with_field("amount", 3_i64)),
            )
            .unwrap();
        logger.flush(DEFAULT_FLUSH_TIMEOUT).unwrap();

        let records = writer.records();
        let parts = parts(&records[0]);
        assert_eq!(parts[0], "host-1");
        assert_eq!(&parts[2..5], &["trace-1", "span-1", "span-2"]);
        assert_eq!(parts[7], "NOTICE");
        assert_eq!(parts[8], "billing::api");
        assert_eq!(parts[9], "api.rs:12");
        assert_eq!(parts[11], "{\"amount\":3}");
    }

    #[test]
    fn test_level_helpers_capture_caller() {
        let writer = Arc::new(MemoryWriter::default());
        let logger = logger(writer.clone(), Severity::Debug);

        logger.error("from the test module");
        logger.flush(DEFAULT_FLUSH_TIMEOUT).unwrap();

        let records = writer.records();
        let parts = parts(&records[0]);
        if parts[8] != "-" {
            assert_eq!(parts[8], "rust_log_transport::core::logger::tests");
        }
    }

    #[test]
    fn test_close_is_idempotent() {
        let writer = Arc::new(MemoryWriter::default());
        let logger = logger(writer, Severity::Debug);

        logger.close();
        logger.close();
        assert!(matches!(
            logger.flush(Duration::from_millis(10)),
            Err(LoggerError::Closed)
        ));
        assert!(matches!(
            logger.log(CallSite::Disabled, &Span::default(), Severity::Info, "late", None),
            Err(LoggerError::Closed)
        ));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = Logger::builder()
            .worker_count(0)
            .writer(Arc::new(MemoryWriter::default()))
            .build();
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_syslog_header_follows_connection() {
        let writer = Arc::new(MemoryWriter::default());
        let logger = Logger::builder()
            .connect("udp", "127.0.0.1:514")
            .hostname("host-1")
            .writer(writer.clone())
            .error_writer(false)
            .build()
            .unwrap();

        logger.emergency("pri");
        logger.flush(DEFAULT_FLUSH_TIMEOUT).unwrap();
        assert!(writer.records()[0].starts_with("<144> host-1 | "));
    }
}

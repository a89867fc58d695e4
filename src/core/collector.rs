//! Span collector
//!
//! Writes finished tracing spans through a [`Logger`]. Access spans follow the
//! access-log convention: always written at `INFO` whatever the threshold,
//! message `[access log] {operation} - {request}`, passwords in the request
//! data masked.

use super::error::Result;
use super::event::{CallSite, LogEvent};
use super::format::Render;
use super::logger::Logger;
use super::payload::StructuredData;
use super::severity::Severity;
use super::span::Span;
use regex::Regex;
use std::sync::OnceLock;

const ACCESS_PREFIX: &str = "[access log] ";
const PASSWORD_MASK: &str = "password=<HIDDEN_BY_SECURITY_FILTER>";

fn password_filter() -> &'static Regex {
    static FILTER: OnceLock<Regex> = OnceLock::new();
    FILTER.get_or_init(|| Regex::new(r"password=[^&\s]+").expect("password pattern is valid"))
}

/// Mask every `password=<value>` in `request`
pub fn mask_passwords(request: &str) -> String {
    password_filter()
        .replace_all(request, PASSWORD_MASK)
        .into_owned()
}

/// One finished span
#[derive(Debug, Clone, Default)]
pub struct CollectedSpan {
    /// Severity name; empty or unknown means `DEBUG`. Ignored for access spans.
    pub level: String,
    pub trace_id: String,
    pub parent_span_id: String,
    pub span_id: String,
    pub operation: String,
    pub request_data: String,
    pub data: Option<StructuredData>,
    pub is_access: bool,
}

pub struct SpanCollector<'a> {
    logger: &'a Logger,
}

impl<'a> SpanCollector<'a> {
    pub fn new(logger: &'a Logger) -> Self {
        Self { logger }
    }

    pub fn collect(&self, span: CollectedSpan) -> Result<()> {
        let mut message = String::new();
        let mut request = span.request_data;

        let severity = if span.is_access {
            message.push_str(ACCESS_PREFIX);
            request = mask_passwords(&request);
            Severity::Info
        } else {
            let severity = span.level.parse().unwrap_or(Severity::Debug);
            if !self.logger.enabled(severity) {
                return Ok(());
            }
            severity
        };

        message.push_str(&span.operation);
        if !request.is_empty() {
            message.push_str(" - ");
            message.push_str(&request);
        }

        let mut event = LogEvent::new(message)
            .with_span(Span {
                trace_id: span.trace_id,
                parent_span_id: span.parent_span_id,
                span_id: span.span_id,
                rollout_type: String::new(),
            })
            .with_call_site(CallSite::Disabled);
        event.data = span.data;

        // Access spans skip the threshold
        let formatter = self.logger.formatter();
        self.logger
            .transport()
            .submit(|buf| event.render(severity, formatter, buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logger::DEFAULT_FLUSH_TIMEOUT;
    use crate::writers::Writer;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryWriter(Mutex<Vec<String>>);

    impl Writer for MemoryWriter {
        fn write(&self, buf: &[u8]) -> Result<usize> {
            self.0
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
            .service("gateway")
            .level(level)
            .worker_count(1)
            .writer(writer)
            .build()
            .unwrap()
    }

    fn fields(record: &str) -> Vec<String> {
        record.split(" | ").map(str::to_string).collect()
    }

    #[test]
    fn test_mask_passwords() {
        assert_eq!(
            mask_passwords("user=bob&password=hunter2&next=/home"),
            "user=bob&password=<HIDDEN_BY_SECURITY_FILTER>&next=/home"
        );
        assert_eq!(
            mask_passwords("password=a password=b"),
            "password=<HIDDEN_BY_SECURITY_FILTER> password=<HIDDEN_BY_SECURITY_FILTER>"
        );
        assert_eq!(mask_passwords("no secrets"), "no secrets");
    }

    #[test]
    fn test_access_span() {
        let writer = Arc::new(MemoryWriter::default());
        let logger = logger(writer.clone(), Severity::Error);

        logger
            .span_collector()
            .collect(CollectedSpan {
                level: "debug".into(),
                trace_id: "t1".into(),
                span_id: "s1".into(),
                operation: "POST /login".into(),
                request_data: "user=bob&password=hunter2".into(),
                is_access: true,
                ..CollectedSpan::default()
            })
            .unwrap();
        logger.flush(DEFAULT_FLUSH_TIMEOUT).unwrap();

        let records = writer.0.lock().unwrap().clone();
        assert_eq!(records.len(), 1);
        let parts = fields(&records[0]);
        assert_eq!(parts[2], "t1");
        assert_eq!(parts[4], "s1");
        assert_eq!(parts[7], "INFO");
        assert_eq!(parts[8], "-");
        assert_eq!(parts[9], "-");
        assert_eq!(
            parts[10],
            "[access log] POST /login - user=bob&password=<HIDDEN_BY_SECURITY_FILTER>"
        );
    }

    #[test]
    fn test_regular_span_level_and_threshold() {
        let writer = Arc::new(MemoryWriter::default());
        let logger = logger(writer.clone(), Severity::Warning);
        let collector = logger.span_collector();

        collector
            .collect(CollectedSpan {
                level: "info".into(),
                operation: "cache.get".into(),
                ..CollectedSpan::default()
            })
            .unwrap();
        collector
            .collect(CollectedSpan {
                level: "ERROR".into(),
                operation: "db.query".into(),
                request_data: "select 1".into(),
                ..CollectedSpan::default()
            })
            .unwrap();
        logger.flush(DEFAULT_FLUSH_TIMEOUT).unwrap();

        let records = writer.0.lock().unwrap().clone();
        assert_eq!(records.len(), 1);
        let parts = fields(&records[0]);
        assert_eq!(parts[7], "ERROR");
        assert_eq!(parts[10], "db.query - select 1");
    }

    #[test]
    fn test_unknown_level_defaults_to_debug() {
        let writer = Arc::new(MemoryWriter::default());
        let logger = logger(writer.clone(), Severity::Debug);

        logger
            .span_collector()
            .collect(CollectedSpan {
                level: "chatty".into(),
                operation: "op".into(),
                ..CollectedSpan::default()
            })
            .unwrap();
        logger.flush(DEFAULT_FLUSH_TIMEOUT).unwrap();

        let records = writer.0.lock().unwrap().clone();
        assert_eq!(fields(&records[0])[7], "DEBUG");
    }
}

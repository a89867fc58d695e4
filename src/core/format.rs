//! Record formatting
//!
//! The std record is one line of 13 delimiter-separated parts:
//!
//! ```text
//! [<PRI> ]hostname | timestamp | traceID | parentSpanID | spanID | rolloutType | service | LEVEL | component | file:line | message | json | .
//! ```
//!
//! Rendering works against a byte budget. Every content field owns one
//! reserved byte, the rest of the budget is shared in field order, and a record
//! that had to be cut ends in `X` instead of `.` so line-oriented readers still
//! see a deterministic end of record.

use super::caller;
use super::event::LogEvent;
use super::severity::Severity;
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::Write as _;
use std::sync::Arc;

/// Field separator
pub const DELIMITER: &str = " | ";

/// Substitute for empty fields
pub const NONE: &str = "-";

/// Syslog facility `local2`
pub const FACILITY: u8 = 18;

/// Default ceiling for one rendered record
pub const DEFAULT_MAX_RECORD_SIZE: usize = 128 * 1024;

/// Number of content fields after the optional PRI header
const CONTENT_FIELDS: usize = 12;

const TERMINATOR: &[u8] = b".\n";
const TRUNCATED_TERMINATOR: &[u8] = b"X\n";

/// Smallest budget that still leaves one byte per content field
pub const MIN_RECORD_SIZE: usize =
    CONTENT_FIELDS * DELIMITER.len() + CONTENT_FIELDS + TERMINATOR.len() + PRI_MAX_LEN;

/// `<191> ` is the longest header facility 18 can produce
const PRI_MAX_LEN: usize = 6;

/// Something that can render itself into a record buffer
///
/// Implemented by [`LogEvent`] (std layout) and [`CeeRecord`]. Rendering never
/// fails: fields that cannot be produced degrade to sentinels.
pub trait Render {
    fn render(&self, severity: Severity, config: &FormatterConfig, out: &mut Vec<u8>);
}

/// Logger-wide values every record carries
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    pub hostname: String,
    pub service: String,
    /// Prefix records with a syslog PRI header
    pub syslog_header: bool,
    /// Hard ceiling for one record, PRI header included
    pub max_record_size: usize,
    /// Module paths stepped over when resolving the caller
    pub backtrace_skips: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            hostname: local_hostname(),
            service: String::new(),
            syslog_header: false,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            backtrace_skips: Vec::new(),
        }
    }
}

impl FormatterConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    #[must_use]
    pub fn with_syslog_header(mut self, enabled: bool) -> Self {
        self.syslog_header = enabled;
        self
    }

    #[must_use]
    pub fn with_max_record_size(mut self, size: usize) -> Self {
        self.max_record_size = size;
        self
    }

    #[must_use]
    pub fn with_backtrace_skips<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backtrace_skips = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Wrap this config in an Arc for sharing across threads
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Syslog PRI value for `severity`
pub fn priority(severity: Severity) -> u16 {
    FACILITY as u16 * 8 + severity.code() as u16
}

fn write_priority(out: &mut Vec<u8>, severity: Severity) -> usize {
    let start = out.len();
    // Writing into a Vec cannot fail
    let _ = write!(out, "<{}> ", priority(severity));
    out.len() - start
}

/// Budgeted writer for the content fields of one record
struct FieldWriter<'a> {
    out: &'a mut Vec<u8>,
    /// Shared budget left after every field's reserved byte
    slack: usize,
    /// Bytes already written to the current field
    written: usize,
    truncated: bool,
}

impl<'a> FieldWriter<'a> {
    fn new(out: &'a mut Vec<u8>, content_budget: usize) -> Self {
        Self {
            out,
            slack: content_budget.saturating_sub(CONTENT_FIELDS),
            written: 0,
            truncated: false,
        }
    }

    fn push(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let reserved = usize::from(self.written == 0);
        let allowance = self.slack + reserved;

        let mut n = data.len().min(allowance);
        if n < data.len() {
            self.truncated = true;
            // Do not split a UTF-8 sequence
            while n > 0 && (data[n] & 0xC0) == 0x80 {
                n -= 1;
            }
        }
        if n == 0 {
            return;
        }

        self.out.extend_from_slice(&data[..n]);
        self.slack -= n - reserved.min(n);
        self.written += n;
    }

    /// Push `data` only if all of it fits
    fn push_whole(&mut self, data: &[u8]) {
        let allowance = self.slack + usize::from(self.written == 0);
        if data.len() > allowance {
            self.truncated = true;
            self.slack = 0;
            return;
        }
        self.push(data);
    }

    /// Write `value`, or `fallback` when it is empty, as one whole field
    fn field(&mut self, value: &str, fallback: &str) {
        let value = if value.is_empty() { fallback } else { value };
        self.push(value.as_bytes());
        self.end_field();
    }

    fn end_field(&mut self) {
        self.written = 0;
        self.out.extend_from_slice(DELIMITER.as_bytes());
    }

    fn finish(self) {
        let end = if self.truncated {
            TRUNCATED_TERMINATOR
        } else {
            TERMINATOR
        };
        self.out.extend_from_slice(end);
    }
}

impl Render for LogEvent {
    fn render(&self, severity: Severity, config: &FormatterConfig, out: &mut Vec<u8>) {
        let mut budget = config
            .max_record_size
            .saturating_sub(CONTENT_FIELDS * DELIMITER.len() + TERMINATOR.len());
        if config.syslog_header {
            budget = budget.saturating_sub(write_priority(out, severity));
        }

        let mut w = FieldWriter::new(out, budget);

        w.field(&config.hostname, NONE);

        w.field(&rfc3339_nano(&self.timestamp), NONE);

        w.field(&self.span.trace_id, NONE);
        w.field(&self.span.parent_span_id, NONE);
        w.field(&self.span.span_id, NONE);
        w.field(&self.span.rollout_type, NONE);
        w.field(&config.service, NONE);
        w.field(severity.to_str(), NONE);

        match caller::resolve(&self.call_site, &self.skip_packages, &config.backtrace_skips) {
            Some(caller) => {
                w.field(&caller.component, NONE);
                w.field(&caller.file_line, NONE);
            }
            None => {
                w.field(NONE, NONE);
                w.field(NONE, NONE);
            }
        }

        write_message(&mut w, &self.message);
        write_data(&mut w, self);
        w.finish();
    }
}

fn write_message(w: &mut FieldWriter<'_>, message: &str) {
    if message.is_empty() {
        w.field(NONE, NONE);
        return;
    }

    let bytes = message.as_bytes();
    let mut start = 0;
    for (i, b) in bytes.iter().enumerate() {
        let escaped: &[u8] = match b {
            b'\\' => b"\\\\",
            b'|' => b"\\|",
            b'\r' => b"\\r",
            b'\n' => b"\\n",
            _ => continue,
        };
        w.push(&bytes[start..i]);
        w.push_whole(escaped);
        start = i + 1;
    }
    w.push(&bytes[start..]);
    w.end_field();
}

fn write_data(w: &mut FieldWriter<'_>, event: &LogEvent) {
    let Some(data) = &event.data else {
        w.push(b"{}");
        w.end_field();
        return;
    };

    let mut json = Vec::with_capacity(256);
    if data.write_json(&mut json).is_err() {
        w.push(b"{}");
        w.end_field();
        return;
    }

    let delimiter = DELIMITER.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i + delimiter.len() <= json.len() {
        if &json[i..i + delimiter.len()] == delimiter {
            w.push(&json[start..i]);
            w.push_whole(b" \\| ");
            i += delimiter.len();
            start = i;
        } else {
            i += 1;
        }
    }
    w.push(&json[start..]);
    w.end_field();
}

/// RFC 3339 UTC timestamp with trailing zero nanoseconds trimmed
///
/// `10:30:45.120000000Z` renders as `10:30:45.12Z` and a whole second drops
/// the fraction entirely.
pub fn rfc3339_nano(timestamp: &DateTime<Utc>) -> String {
    let mut out = timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);
    // Always ends in "Z" with a nine digit fraction before it
    let zone = out.len() - 1;
    let trimmed = out[..zone].trim_end_matches('0').trim_end_matches('.').len();
    out.replace_range(trimmed..zone, "");
    out
}

/// CEE (`@cee:`) record: PRI header followed by the payload as JSON
///
/// ```text
/// <150> @cee:{"event":"login","user":42}
/// ```
#[derive(Debug, Clone, Default)]
pub struct CeeRecord {
    pub data: super::payload::StructuredData,
}

impl CeeRecord {
    pub fn new(data: super::payload::StructuredData) -> Self {
        Self { data }
    }
}

impl Render for CeeRecord {
    fn render(&self, severity: Severity, _config: &FormatterConfig, out: &mut Vec<u8>) {
        let _ = write!(out, "<{}> @cee:", priority(severity));
        let mark = out.len();
        if self.data.write_json(out).is_err() {
            out.truncate(mark);
            out.extend_from_slice(b"{}");
        }
        out.push(b'\n');
    }
}

/// System hostname, or the sentinel when it cannot be read
pub fn local_hostname() -> String {
    #[cfg(unix)]
    {
        let mut buf = [0u8; 256];
        // SAFETY: the pointer and length describe `buf`, which outlives the call
        let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
        if rc == 0 {
            let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            if let Ok(name) = std::str::from_utf8(&buf[..len]) {
                if !name.is_empty() {
                    return name.to_string();
                }
            }
        }
    }
    std::env::var("HOSTNAME").unwrap_or_else(|_| NONE.to_string())
}

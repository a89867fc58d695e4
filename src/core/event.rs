//! Log event structure

use super::payload::StructuredData;
use super::span::Span;
use chrono::{DateTime, Utc};

/// Where the record's component and `file:line` fields come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSite {
    /// No caller information; both fields render as the sentinel
    Disabled,

    /// Walk the stack at render time, skipping this crate's own frames and
    /// then `skip` more caller frames
    Stack { skip: usize },

    /// Location captured at compile time by the logging macros
    Static {
        module: &'static str,
        file: &'static str,
        line: u32,
    },
}

impl Default for CallSite {
    fn default() -> Self {
        CallSite::Stack { skip: 0 }
    }
}

/// One log event, built per call and consumed by the formatter
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub data: Option<StructuredData>,
    pub span: Span,
    pub call_site: CallSite,
    /// Module paths to step over when resolving the caller, on top of the
    /// logger's configured list
    pub skip_packages: Vec<String>,
}

impl LogEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
            data: None,
            span: Span::default(),
            call_site: CallSite::default(),
            skip_packages: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: StructuredData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = call_site;
        self
    }

    /// Skip `skip` extra frames when walking the stack
    pub fn with_stack_skip(mut self, skip: usize) -> Self {
        self.call_site = CallSite::Stack { skip };
        self
    }

    pub fn without_call_site(mut self) -> Self {
        self.call_site = CallSite::Disabled;
        self
    }

    pub fn with_location(mut self, module: &'static str, file: &'static str, line: u32) -> Self {
        self.call_site = CallSite::Static { module, file, line };
        self
    }

    pub fn with_skip_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let event = LogEvent::new("hello");
        assert_eq!(event.message, "hello");
        assert!(event.data.is_none());
        assert!(event.span.is_empty());
        assert_eq!(event.call_site, CallSite::Stack { skip: 0 });
    }

    #[test]
    fn test_builders() {
        let event = LogEvent::new("hello")
            .with_location("app::handlers", "src/handlers.rs", 42)
            .with_skip_packages(["app::wrapper"]);

        assert_eq!(
            event.call_site,
            CallSite::Static {
                module: "app::handlers",
                file: "src/handlers.rs",
                line: 42
            }
        );
        assert_eq!(event.skip_packages, vec!["app::wrapper".to_string()]);

        let event = event.without_call_site();
        assert_eq!(event.call_site, CallSite::Disabled);
    }
}

//! Distributed tracing identifiers carried by a log event

use serde::{Deserialize, Serialize};

/// Request tracing identifiers; an empty string means the id is absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Trace ID for request correlation
    #[serde(default)]
    pub trace_id: String,

    /// Parent span ID (if any)
    #[serde(default)]
    pub parent_span_id: String,

    /// Span ID for this operation
    #[serde(default)]
    pub span_id: String,

    /// Rollout or traffic segment tag
    #[serde(default)]
    pub rollout_type: String,
}

impl Span {
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            ..Self::default()
        }
    }

    /// Set parent span ID
    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = parent_span_id.into();
        self
    }

    pub fn with_rollout(mut self, rollout_type: impl Into<String>) -> Self {
        self.rollout_type = rollout_type.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.trace_id.is_empty()
            && self.parent_span_id.is_empty()
            && self.span_id.is_empty()
            && self.rollout_type.is_empty()
    }
}

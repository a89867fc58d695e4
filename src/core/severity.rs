//! Severity definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity, ordered from least to most important.
///
/// The numeric syslog code (RFC 5424 section 6.2.1) runs the other way and is
/// available through [`Severity::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
#[derive(Default)]
pub enum Severity {
    #[default]
    Debug = 0,
    Info = 1,
    Notice = 2,
    Warning = 3,
    Error = 4,
    Critical = 5,
    Alert = 6,
    Emergency = 7,
}

impl Severity {
    pub const ALL: [Severity; 8] = [
        Severity::Debug,
        Severity::Info,
        Severity::Notice,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
        Severity::Alert,
        Severity::Emergency,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }

    /// Syslog severity code: `Emergency = 0` through `Debug = 7`
    #[inline]
    pub fn code(&self) -> u8 {
        7 - *self as u8
    }

    /// Inverse of [`Severity::code`]
    pub fn from_code(code: u8) -> Option<Self> {
        if code > 7 {
            return None;
        }
        Self::from_ordinal(7 - code)
    }

    fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Returned when a string names no severity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid severity: '{0}'")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(Severity::Debug),
            "INFO" => Ok(Severity::Info),
            "NOTICE" => Ok(Severity::Notice),
            "WARNING" => Ok(Severity::Warning),
            "ERROR" => Ok(Severity::Error),
            "CRITICAL" => Ok(Severity::Critical),
            "ALERT" => Ok(Severity::Alert),
            "EMERGENCY" => Ok(Severity::Emergency),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = ParseSeverityError;

    fn try_from(value: String) -> Result<Self, ParseSeverityError> {
        value.parse()
    }
}

impl From<Severity> for &'static str {
    fn from(severity: Severity) -> Self {
        severity.to_str()
    }
}

/// Severity threshold that can be read and replaced without locking
#[derive(Debug)]
pub struct AtomicSeverity(AtomicU8);

impl AtomicSeverity {
    pub const fn new(severity: Severity) -> Self {
        Self(AtomicU8::new(severity as u8))
    }

    #[inline]
    pub fn load(&self) -> Severity {
        Severity::from_ordinal(self.0.load(Ordering::Relaxed)).unwrap_or_default()
    }

    #[inline]
    pub fn store(&self, severity: Severity) {
        self.0.store(severity as u8, Ordering::Relaxed);
    }
}

impl Default for AtomicSeverity {
    fn default() -> Self {
        Self::new(Severity::Debug)
    }
}

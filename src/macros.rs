//! Logging macros for ergonomic log message formatting.
//!
//! The macros check the threshold before formatting anything and record the
//! call site at compile time, so no stack walk is needed to fill the
//! component and `file:line` fields.
//!
//! # Examples
//!
//! ```no_run
//! use rust_log_transport::prelude::*;
//! use rust_log_transport::{info, warning};
//!
//! let logger = Logger::builder().service("billing").build().unwrap();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! let span = Span::new("3ymrswshj4sg", "6yaoivssj1rt");
//! warning!(logger, span: &span, "Slow upstream: {} ms", 950);
//! ```

/// Compile-time call site of the macro invocation
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::core::CallSite::Static {
            module: module_path!(),
            file: file!(),
            line: line!(),
        }
    };
}

/// Log a message at an explicit severity.
///
/// Enqueue failures are counted by the transport and not returned.
///
/// # Examples
///
/// ```no_run
/// # use rust_log_transport::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use rust_log_transport::log;
/// log!(logger, Severity::Info, "Simple message");
/// log!(logger, Severity::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, span: $span:expr, $($arg:tt)+) => {{
        let _ = $logger.logf(
            $crate::call_site!(),
            $span,
            $level,
            format_args!($($arg)+),
            None,
        );
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let _ = $logger.logf(
            $crate::call_site!(),
            &$crate::core::Span::default(),
            $level,
            format_args!($($arg)+),
            None,
        );
    }};
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```no_run
/// # use rust_log_transport::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use rust_log_transport::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::Info, $($arg)+)
    };
}

/// Log a notice-level message.
#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::Notice, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```no_run
/// # use rust_log_transport::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use rust_log_transport::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::Critical, $($arg)+)
    };
}

/// Log an alert-level message.
#[macro_export]
macro_rules! alert {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::Alert, $($arg)+)
    };
}

/// Log an emergency-level message.
#[macro_export]
macro_rules! emergency {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::Emergency, $($arg)+)
    };
}

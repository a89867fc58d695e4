//! Property-based tests for rust_log_transport using proptest

use proptest::prelude::*;
use rust_log_transport::core::collector::mask_passwords;
use rust_log_transport::core::format::{priority, Render, MIN_RECORD_SIZE};
use rust_log_transport::core::BufferPool;
use rust_log_transport::prelude::*;

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Debug),
        Just(Severity::Info),
        Just(Severity::Notice),
        Just(Severity::Warning),
        Just(Severity::Error),
        Just(Severity::Critical),
        Just(Severity::Alert),
        Just(Severity::Emergency),
    ]
}

fn render(event: &LogEvent, severity: Severity, config: &FormatterConfig) -> Vec<u8> {
    let mut out = Vec::new();
    event.render(severity, config, &mut out);
    out
}

// ============================================================================
// Severity Tests
// ============================================================================

proptest! {
    /// Test that severity names roundtrip through parsing
    #[test]
    fn test_severity_str_roundtrip(level in severity()) {
        let parsed: Severity = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);

        let lower: Severity = level.to_str().to_lowercase().parse().unwrap();
        prop_assert_eq!(level, lower);
    }

    /// Test that ordering runs opposite to the syslog code
    #[test]
    fn test_severity_order_matches_code(a in severity(), b in severity()) {
        prop_assert_eq!(a < b, a.code() > b.code());
        prop_assert_eq!(Severity::from_code(a.code()), Some(a));
    }

    /// Test that the PRI value encodes facility 18 and the code
    #[test]
    fn test_priority_encoding(level in severity()) {
        let pri = priority(level);
        prop_assert_eq!(pri / 8, 18);
        prop_assert_eq!((pri % 8) as u8, level.code());
    }
}

// ============================================================================
// Record Layout Tests
// ============================================================================

proptest! {
    /// Test that any message renders into a well-formed record
    #[test]
    fn test_record_shape(
        message in any::<String>(),
        trace_id in "[a-z0-9]{0,16}",
        span_id in "[a-z0-9]{0,16}",
        hostname in "[a-z0-9.-]{0,24}",
        service in "[a-z_]{0,12}",
        level in severity(),
        header in any::<bool>(),
        max in MIN_RECORD_SIZE..2048usize,
    ) {
        let config = FormatterConfig::new()
            .with_hostname(hostname)
            .with_service(service)
            .with_syslog_header(header)
            .with_max_record_size(max);
        let event = LogEvent::new(message)
            .with_span(Span::new(trace_id, span_id))
            .without_call_site();

        let out = render(&event, level, &config);
        prop_assert!(out.len() <= max, "{} bytes > {}", out.len(), max);

        let record = std::str::from_utf8(&out).expect("record is valid UTF-8");
        prop_assert_eq!(record.matches('\n').count(), 1);
        prop_assert!(record.ends_with(" | .\n") || record.ends_with(" | X\n"));
        prop_assert_eq!(record.split(" | ").count(), 13);

        if header {
            let expected = format!("<{}> ", priority(level));
            prop_assert!(record.starts_with(&expected));
        }
    }

    /// Test that a record is truncated exactly when it would not fit
    #[test]
    fn test_truncation_marker(len in 0usize..4096) {
        let max = 1024;
        let config = FormatterConfig::new()
            .with_hostname("h")
            .with_service("s")
            .with_max_record_size(max);
        let event = LogEvent::new("a".repeat(len)).without_call_site();

        let untruncated = render(&event, Severity::Info, &config.clone().with_max_record_size(64 * 1024));
        let out = render(&event, Severity::Info, &config);

        if untruncated.len() <= max {
            prop_assert_eq!(out, untruncated);
        } else {
            prop_assert!(out.ends_with(b" | X\n"));
            prop_assert!(out.len() <= max);
        }
    }

    /// Test that alphanumeric payloads survive rendering verbatim
    #[test]
    fn test_payload_field(key in "[a-z]{1,8}", value in "[A-Za-z0-9 ]{0,32}") {
        let data = StructuredData::new().with_field(key.clone(), value.clone());
        let event = LogEvent::new("m").without_call_site().with_data(data);

        let out = render(&event, Severity::Info, &FormatterConfig::new().with_hostname("h"));
        let record = String::from_utf8(out).unwrap();
        let parts: Vec<&str> = record.split(" | ").collect();
        let parsed: serde_json::Value = serde_json::from_str(parts[11]).unwrap();
        prop_assert_eq!(parsed[key.as_str()].as_str(), Some(value.as_str()));
    }
}

// ============================================================================
// Access Log Masking Tests
// ============================================================================

proptest! {
    /// Test that no password value survives masking
    #[test]
    fn test_password_masking(
        prefix in "[a-z]{1,8}=[a-z0-9]{0,8}",
        secret in "[A-Za-z0-9!@#]{1,16}",
    ) {
        let request = format!("{}&password={}&next=1", prefix, secret);
        let masked = mask_passwords(&request);

        prop_assert!(masked.contains("password=<HIDDEN_BY_SECURITY_FILTER>"));
        prop_assert!(masked.starts_with(&prefix));
        prop_assert!(masked.ends_with("&next=1"));
        let leaked = format!("password={}", secret);
        prop_assert!(!masked.contains(&leaked));
    }
}

// ============================================================================
// Buffer Pool Tests
// ============================================================================

proptest! {
    /// Test that the pool never keeps buffers above its hard ceiling
    #[test]
    fn test_pool_respects_ceiling(sizes in prop::collection::vec(1usize..32 * 1024, 1..64)) {
        let max = 16 * 1024;
        let pool = BufferPool::new(max, 64);

        for size in &sizes {
            let mut buf = pool.get();
            buf.resize(*size, b'x');
            pool.observe(buf.len());
            pool.put(buf);
        }

        for _ in 0..pool.idle() {
            let buf = pool.get();
            prop_assert!(buf.capacity() <= max);
            prop_assert!(buf.is_empty());
        }
    }
}

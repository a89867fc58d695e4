//! Criterion benchmarks for rust_log_transport

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_log_transport::core::format::Render;
use rust_log_transport::core::BufferPool;
use rust_log_transport::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// Writer that accepts everything
struct NullWriter;

impl Writer for NullWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        Ok(buf.len())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn null_logger(level: Severity) -> Logger {
    Logger::builder()
        .service("bench")
        .hostname("bench-host")
        .level(level)
        .worker_count(2)
        .error_writer(false)
        .writer(Arc::new(NullWriter))
        .build()
        .expect("Failed to build logger")
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.throughput(Throughput::Elements(1));

    let config = FormatterConfig::new()
        .with_hostname("bench-host")
        .with_service("bench")
        .with_syslog_header(true);
    let span = Span::new("3ymrswshj4sg", "6yaoivssj1rt").with_parent("parent-1");

    let plain = LogEvent::new("payment accepted")
        .with_span(span.clone())
        .with_location("bench::api", "src/api.rs", 42);
    group.bench_function("plain", |b| {
        let mut out = Vec::with_capacity(1024);
        b.iter(|| {
            out.clear();
            plain.render(black_box(Severity::Info), &config, &mut out);
            black_box(out.len())
        });
    });

    let escaped = LogEvent::new("line one\nline two | with pipes \\ and slashes\r\n")
        .with_span(span.clone())
        .with_location("bench::api", "src/api.rs", 42);
    group.bench_function("escaped", |b| {
        let mut out = Vec::with_capacity(1024);
        b.iter(|| {
            out.clear();
            escaped.render(black_box(Severity::Info), &config, &mut out);
            black_box(out.len())
        });
    });

    let with_data = LogEvent::new("payment accepted")
        .with_span(span)
        .with_location("bench::api", "src/api.rs", 42)
        .with_data(
            StructuredData::new()
                .with_field("amount", 1250_i64)
                .with_field("currency", "EUR")
                .with_field("customer", "c-8812"),
        );
    group.bench_function("structured_data", |b| {
        let mut out = Vec::with_capacity(1024);
        b.iter(|| {
            out.clear();
            with_data.render(black_box(Severity::Info), &config, &mut out);
            black_box(out.len())
        });
    });

    let stack = LogEvent::new("stack walk");
    group.bench_function("stack_call_site", |b| {
        let mut out = Vec::with_capacity(1024);
        b.iter(|| {
            out.clear();
            stack.render(black_box(Severity::Info), &config, &mut out);
            black_box(out.len())
        });
    });

    group.finish();
}

fn bench_truncation(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncation");

    for size in [1024usize, 16 * 1024, 256 * 1024] {
        let config = FormatterConfig::new()
            .with_hostname("bench-host")
            .with_max_record_size(4096);
        let event = LogEvent::new("x".repeat(size)).without_call_site();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &event, |b, event| {
            let mut out = Vec::with_capacity(8192);
            b.iter(|| {
                out.clear();
                event.render(Severity::Info, &config, &mut out);
                black_box(out.len())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Logging Performance Benchmarks
// ============================================================================

fn bench_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("logging");
    group.throughput(Throughput::Elements(1));

    let logger = null_logger(Severity::Debug);
    let span = Span::new("3ymrswshj4sg", "6yaoivssj1rt");

    group.bench_function("info", |b| {
        b.iter(|| {
            let _ = logger.log(
                CallSite::Disabled,
                &span,
                Severity::Info,
                black_box("Info message"),
                None,
            );
        });
    });

    group.bench_function("logf", |b| {
        b.iter(|| {
            let _ = logger.logf(
                CallSite::Disabled,
                &span,
                Severity::Info,
                format_args!("charged {} cents", black_box(1250)),
                None,
            );
        });
    });

    let _ = logger.flush(Duration::from_secs(10));
    group.finish();
}

fn bench_filtered(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtered");
    group.throughput(Throughput::Elements(1));

    let logger = null_logger(Severity::Error);

    group.bench_function("debug_below_threshold", |b| {
        b.iter(|| {
            logger.debug(black_box("Debug message"));
        });
    });

    group.bench_function("logf_below_threshold", |b| {
        b.iter(|| {
            let _ = logger.logf(
                CallSite::Disabled,
                &Span::default(),
                Severity::Debug,
                format_args!("value {}", black_box(42)),
                None,
            );
        });
    });

    group.finish();
}

// ============================================================================
// Buffer Pool Benchmarks
// ============================================================================

fn bench_buffer_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool");
    group.throughput(Throughput::Elements(1));

    let pool = BufferPool::default();
    group.bench_function("get_put", |b| {
        b.iter(|| {
            let mut buf = pool.get();
            buf.extend_from_slice(black_box(b"a rendered record of modest size\n"));
            pool.observe(buf.len());
            pool.put(buf);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_render,
    bench_truncation,
    bench_logging,
    bench_filtered,
    bench_buffer_pool
);
criterion_main!(benches);

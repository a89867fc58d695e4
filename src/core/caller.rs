//! Call-site resolution for the record's component and `file:line` fields
//!
//! Stack walking goes through `std::backtrace`. Capturing a backtrace is far
//! more expensive than the rest of the formatting path, so the logging macros
//! pass a [`CallSite::Static`] location and only direct `log`/`logf` calls pay
//! for a walk. When symbols are unavailable (stripped binaries) resolution
//! returns `None` and the formatter falls back to sentinels.

use super::event::CallSite;
use std::backtrace::Backtrace;

/// Resolved caller information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Module path of the calling function
    pub component: String,
    /// `basename:line`
    pub file_line: String,
}

/// One frame parsed from a backtrace
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub symbol: String,
    pub location: Option<(String, u32)>,
}

/// Frames from these roots never count as the caller
const RUNTIME_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "backtrace::",
    "std_detect::",
    "__rust",
];

/// Modules of this crate that sit between the user and the capture point
const INTERNAL_MODULES: &[&str] = &[
    "core::caller",
    "core::event",
    "core::format",
    "core::logger",
    "core::transport",
    "core::collector",
];

/// Resolve a call site into caller information
///
/// `extra_skips` come from the event and `config_skips` from the logger; both
/// name module paths whose frames should be stepped over.
pub fn resolve(call_site: &CallSite, extra_skips: &[String], config_skips: &[String]) -> Option<Caller> {
    match call_site {
        CallSite::Disabled => None,
        CallSite::Static { module, file, line } => Some(Caller {
            component: (*module).to_string(),
            file_line: file_line(file, *line),
        }),
        CallSite::Stack { skip } => {
            let trace = Backtrace::force_capture().to_string();
            let frames = parse_frames(&trace);
            select_frame(&frames, *skip, extra_skips, config_skips)
        }
    }
}

/// Parse the `Display` output of `std::backtrace::Backtrace`
pub(crate) fn parse_frames(trace: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in trace.lines() {
        let trimmed = line.trim_start();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.location.is_none() {
                    frame.location = parse_location(location);
                }
            }
            continue;
        }

        if let Some((index, symbol)) = trimmed.split_once(": ") {
            if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                frames.push(Frame {
                    symbol: symbol.trim().to_string(),
                    location: None,
                });
            }
        }
    }

    frames
}

fn parse_location(location: &str) -> Option<(String, u32)> {
    let (rest, last) = location.trim().rsplit_once(':')?;
    let last: u32 = last.parse().ok()?;

    // `path:line:column` or just `path:line`
    if let Some((path, line)) = rest.rsplit_once(':') {
        if let Ok(line) = line.parse::<u32>() {
            return Some((path.to_string(), line));
        }
    }
    Some((rest.to_string(), last))
}

pub(crate) fn select_frame(
    frames: &[Frame],
    skip: usize,
    extra_skips: &[String],
    config_skips: &[String],
) -> Option<Caller> {
    let first_external = frames.iter().position(|f| !is_internal(&f.symbol))?;
    let candidates = frames.get(first_external + skip..)?;
    let fallback = candidates.first()?;

    let chosen = candidates
        .iter()
        .find(|frame| {
            let component = component_name(&frame.symbol);
            !is_internal(&frame.symbol)
                && !is_skipped(&component, extra_skips)
                && !is_skipped(&component, config_skips)
        })
        .unwrap_or(fallback);

    Some(Caller {
        component: component_name(&chosen.symbol),
        file_line: chosen
            .location
            .as_ref()
            .map(|(path, line)| file_line(path, *line))
            .unwrap_or_default(),
    })
}

fn is_internal(symbol: &str) -> bool {
    if symbol.starts_with("<unknown>") {
        return true;
    }
    let path = symbol_path(symbol);
    if RUNTIME_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }

    let Some(rest) = path
        .strip_prefix(env!("CARGO_CRATE_NAME"))
        .and_then(|r| r.strip_prefix("::"))
    else {
        return false;
    };
    if rest.contains("::tests") {
        return false;
    }
    INTERNAL_MODULES.iter().any(|m| {
        rest.strip_prefix(m)
            .is_some_and(|tail| tail.is_empty() || tail.starts_with("::"))
    })
}

fn is_skipped(component: &str, packages: &[String]) -> bool {
    packages.iter().any(|p| {
        component == p
            || component
                .strip_prefix(p.as_str())
                .is_some_and(|tail| tail.starts_with("::"))
    })
}

/// Path part of a demangled symbol: hash removed, `<T as Trait>` unwrapped to
/// `T`, generic arguments cut
fn symbol_path(symbol: &str) -> &str {
    let mut path = strip_hash(symbol);
    if let Some(inner) = path.strip_prefix('<') {
        let end = inner
            .find(" as ")
            .or_else(|| inner.find('>'))
            .unwrap_or(inner.len());
        path = &inner[..end];
    }
    match path.find('<') {
        Some(i) => &path[..i],
        None => path,
    }
}

fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) => head,
        _ => symbol,
    }
}

/// Module path of the function that owns `symbol`
///
/// The function name, closure markers and type segments (upper-case initial)
/// are removed: `app::api::Handler::serve::{{closure}}` becomes `app::api`.
pub(crate) fn component_name(symbol: &str) -> String {
    let qualified = strip_hash(symbol).starts_with('<');
    let mut segments: Vec<&str> = symbol_path(symbol)
        .split("::")
        .filter(|s| !s.is_empty() && !s.starts_with('{'))
        .collect();

    if !qualified && segments.len() > 1 {
        segments.pop();
    }

    segments
        .into_iter()
        .filter(|s| !s.starts_with(|c: char| c.is_ascii_uppercase()))
        .collect::<Vec<_>>()
        .join("::")
}

fn file_line(path: &str, line: u32) -> String {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    format!("{}:{}", base, line)
}

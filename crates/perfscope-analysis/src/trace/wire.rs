//! Trace line grammar: `[<timestamp>] <S|E> <token>`.

use std::sync::LazyLock;

use perfscope_core::types::EventKind;
use regex::Regex;

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d+)\] (S|E|ENTER|EXIT) (.+)$").expect("trace line pattern is valid")
});

/// A parsed but not yet offset-corrected or de-hashed trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLine<'a> {
    pub timestamp: i64,
    pub kind: EventKind,
    pub token: &'a str,
}

/// Parse one trace line. Returns `None` for anything that does not match the
/// grammar, including timestamps that overflow `i64` and blank tokens.
pub fn parse_line(line: &str) -> Option<RawLine<'_>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = LINE_PATTERN.captures(line)?;
    let timestamp = caps.get(1)?.as_str().parse::<i64>().ok()?;
    let kind = EventKind::from_marker(caps.get(2)?.as_str())?;
    let token = caps.get(3)?.as_str().trim();
    if token.is_empty() {
        return None;
    }
    Some(RawLine {
        timestamp,
        kind,
        token,
    })
}
